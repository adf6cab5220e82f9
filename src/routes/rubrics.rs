use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RequireClassroomPolicy, ResolveResource, ResourceKind};
use crate::models::grading::requests::RubricRequest;
use crate::models::user_classrooms::policies::ClassroomPolicy;
use crate::services::RubricService;

static RUBRIC_SERVICE: Lazy<RubricService> = Lazy::new(RubricService::new_lazy);

pub async fn list_rubrics(req: HttpRequest) -> ActixResult<HttpResponse> {
    RUBRIC_SERVICE.list_rubrics(&req).await
}

pub async fn create_rubric(
    req: HttpRequest,
    body: web::Json<RubricRequest>,
) -> ActixResult<HttpResponse> {
    RUBRIC_SERVICE.create_rubric(&req, body.into_inner()).await
}

pub async fn update_rubric(
    req: HttpRequest,
    body: web::Json<RubricRequest>,
) -> ActixResult<HttpResponse> {
    RUBRIC_SERVICE.update_rubric(&req, body.into_inner()).await
}

pub async fn delete_rubric(req: HttpRequest) -> ActixResult<HttpResponse> {
    RUBRIC_SERVICE.delete_rubric(&req).await
}

pub fn configure_rubric_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/rubrics")
            .route(
                web::get()
                    .to(list_rubrics)
                    .wrap(RequireClassroomPolicy::new(&[ClassroomPolicy::Viewable])),
            )
            .route(
                web::post()
                    .to(create_rubric)
                    .wrap(RequireClassroomPolicy::manager()),
            ),
    )
    .service(
        web::resource("/rubrics/{rubric_id}")
            .wrap(ResolveResource::new(ResourceKind::Rubric))
            .route(
                web::put()
                    .to(update_rubric)
                    .wrap(RequireClassroomPolicy::manager()),
            )
            .route(
                web::delete()
                    .to(delete_rubric)
                    .wrap(RequireClassroomPolicy::manager()),
            ),
    );
}
