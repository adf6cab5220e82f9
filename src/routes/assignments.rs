use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RequireClassroomPolicy, ResolveResource, ResourceKind};
use crate::models::assignments::requests::{
    AssignRubricsRequest, CreateAssignmentRequest, InviteTeamsRequest, ReportQuery,
    UpdateAssignmentRequest,
};
use crate::models::user_classrooms::policies::ClassroomPolicy;
use crate::services::AssignmentService;

static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);

pub async fn list_assignments(req: HttpRequest) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.list_assignments(&req).await
}

pub async fn create_assignment(
    req: HttpRequest,
    body: web::Json<CreateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .create_assignment(&req, body.into_inner())
        .await
}

pub async fn get_assignment(req: HttpRequest) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.get_assignment(&req).await
}

pub async fn update_assignment(
    req: HttpRequest,
    body: web::Json<UpdateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .update_assignment(&req, body.into_inner())
        .await
}

pub async fn invite_teams(
    req: HttpRequest,
    body: web::Json<InviteTeamsRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .invite_teams(&req, body.into_inner())
        .await
}

pub async fn accept_assignment(req: HttpRequest) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.accept_assignment(&req).await
}

pub async fn list_projects(req: HttpRequest) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.list_projects(&req).await
}

pub async fn list_rubrics(req: HttpRequest) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.list_rubrics(&req).await
}

pub async fn assign_rubrics(
    req: HttpRequest,
    body: web::Json<AssignRubricsRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .assign_rubrics(&req, body.into_inner())
        .await
}

pub async fn pull_junit_results(req: HttpRequest) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.pull_junit_results(&req).await
}

pub async fn assignment_report(
    req: HttpRequest,
    query: web::Query<ReportQuery>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .assignment_report(&req, query.into_inner())
        .await
}

fn manager_active() -> RequireClassroomPolicy {
    RequireClassroomPolicy::new(&[
        ClassroomPolicy::Viewable,
        ClassroomPolicy::OwnerOrModerator,
        ClassroomPolicy::NotArchived,
    ])
}

pub fn configure_assignment_routes(cfg: &mut web::ServiceConfig) {
    let viewable = || RequireClassroomPolicy::new(&[ClassroomPolicy::Viewable]);

    cfg.service(
        web::resource("/assignments")
            .route(web::get().to(list_assignments).wrap(viewable()))
            .route(web::post().to(create_assignment).wrap(manager_active())),
    )
    .service(
        web::scope("/assignments/{assignment_id}")
            .wrap(ResolveResource::new(ResourceKind::Assignment))
            .service(
                web::resource("")
                    .route(web::get().to(get_assignment).wrap(viewable()))
                    .route(web::put().to(update_assignment).wrap(manager_active())),
            )
            .route("/invite", web::post().to(invite_teams).wrap(manager_active()))
            .route(
                "/accept",
                web::post()
                    .to(accept_assignment)
                    .wrap(RequireClassroomPolicy::new(&[
                        ClassroomPolicy::Viewable,
                        ClassroomPolicy::Student,
                        ClassroomPolicy::NotArchived,
                    ])),
            )
            // 学生只能看到自己团队的项目，在处理函数中过滤
            .route("/projects", web::get().to(list_projects).wrap(viewable()))
            .service(
                web::resource("/rubrics")
                    .route(web::get().to(list_rubrics).wrap(viewable()))
                    .route(
                        web::put()
                            .to(assign_rubrics)
                            .wrap(RequireClassroomPolicy::manager()),
                    ),
            )
            .route(
                "/junit",
                web::post()
                    .to(pull_junit_results)
                    .wrap(RequireClassroomPolicy::manager()),
            )
            .route(
                "/report",
                web::get()
                    .to(assignment_report)
                    .wrap(RequireClassroomPolicy::manager()),
            ),
    );
}
