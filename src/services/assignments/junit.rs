use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{debug, info};

use super::AssignmentService;
use crate::models::{
    ApiResponse, ErrorCode, assignments::entities::Assignment,
    projects::responses::JunitPullResponse,
};
use crate::services::{classroom_context, gitlab_error, internal_error, require_extension};

/// 从每个已接受项目的最新流水线拉取测试报告摘要；还没有流水线的项目计入 missing
pub async fn pull_junit_results(
    service: &AssignmentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (ctx, assignment) = match (
        classroom_context(request),
        require_extension::<Assignment>(request, "assignment"),
    ) {
        (Ok(ctx), Ok(assignment)) => (ctx, assignment),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };
    if !assignment.enable_junit_grading {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "JUnit grading is disabled for this assignment",
        )));
    }
    let storage = service.get_storage(request);

    let projects = match storage.list_assignment_projects(assignment.id).await {
        Ok(projects) => projects,
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::GradingFailed,
                format!("Failed to load assignment projects: {e}"),
            ));
        }
    };

    let mut summary = JunitPullResponse {
        updated: 0,
        missing: 0,
    };
    for project in projects.iter().filter(|p| p.project_status.is_accepted()) {
        let Some(gitlab_project_id) = project.gitlab_project_id else {
            continue;
        };
        let report = match ctx
            .gitlab
            .get_project_latest_pipeline_test_report_summary(gitlab_project_id, None)
            .await
        {
            Ok(report) => report,
            Err(e) if e.is_not_found() || e.is_forbidden() => {
                debug!("Project {} has no pipeline yet", gitlab_project_id);
                summary.missing += 1;
                continue;
            }
            Err(e) => return Ok(gitlab_error("Failed to load test report", &e)),
        };
        if let Err(e) = storage.update_junit_result(project.id, &report).await {
            return Ok(internal_error(
                ErrorCode::GradingFailed,
                format!("Failed to store test report: {e}"),
            ));
        }
        summary.updated += 1;
    }

    info!(
        "Assignment {}: pulled {} JUnit reports, {} missing",
        assignment.id, summary.updated, summary.missing
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        summary,
        "JUnit results updated",
    )))
}
