use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RequireClassroomPolicy, ResolveResource, ResourceKind};
use crate::models::grading::requests::UpdateGradingResultsRequest;
use crate::models::user_classrooms::policies::ClassroomPolicy;
use crate::services::ProjectService;

static PROJECT_SERVICE: Lazy<ProjectService> = Lazy::new(ProjectService::new_lazy);

pub async fn get_project(req: HttpRequest) -> ActixResult<HttpResponse> {
    PROJECT_SERVICE.get_project(&req).await
}

pub async fn redirect_to_gitlab(req: HttpRequest) -> ActixResult<HttpResponse> {
    PROJECT_SERVICE.redirect_to_gitlab(&req).await
}

pub async fn get_pipeline(req: HttpRequest) -> ActixResult<HttpResponse> {
    PROJECT_SERVICE.get_pipeline(&req).await
}

pub async fn update_grading_results(
    req: HttpRequest,
    body: web::Json<UpdateGradingResultsRequest>,
) -> ActixResult<HttpResponse> {
    PROJECT_SERVICE
        .update_grading_results(&req, body.into_inner())
        .await
}

pub fn configure_project_routes(cfg: &mut web::ServiceConfig) {
    // 学生只能访问自己团队的项目，除非课堂允许查看全部
    let visible = || {
        RequireClassroomPolicy::new(&[ClassroomPolicy::Viewable, ClassroomPolicy::ProjectVisible])
    };

    cfg.service(
        web::scope("/projects/{project_id}")
            .wrap(ResolveResource::new(ResourceKind::Project))
            .route("", web::get().to(get_project).wrap(visible()))
            .route("/gitlab", web::get().to(redirect_to_gitlab).wrap(visible()))
            .route("/pipeline", web::get().to(get_pipeline).wrap(visible()))
            .route(
                "/grading",
                web::put()
                    .to(update_grading_results)
                    .wrap(RequireClassroomPolicy::manager()),
            ),
    );
}
