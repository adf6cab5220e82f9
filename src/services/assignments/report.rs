use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use super::AssignmentService;
use crate::errors::Result;
use crate::models::{
    ApiResponse, ErrorCode,
    assignments::{entities::Assignment, requests::ReportQuery},
    grading::entities::ManualGradingRubric,
    reports::{AssignmentReportInput, ReportResponse, ReportRow, build_assignment_rows, render_csv},
    teams::entities::TeamWithMembers,
};
use crate::services::{internal_error, require_extension};
use crate::storage::Storage;

/// 一个作业的报表行以及作业挂载的细则
pub(crate) async fn assignment_rows(
    storage: &dyn Storage,
    assignment: &Assignment,
    teams: &[TeamWithMembers],
) -> Result<(Vec<ReportRow>, Vec<ManualGradingRubric>)> {
    let projects = storage.list_assignment_projects(assignment.id).await?;
    let rubrics = storage.list_assignment_rubrics(assignment.id).await?;
    let results = storage.list_assignment_grading_results(assignment.id).await?;

    let rows = build_assignment_rows(&AssignmentReportInput {
        assignment,
        teams,
        projects: &projects,
        rubrics: &rubrics,
        results: &results,
    });
    Ok((rows, rubrics))
}

/// JSON 或 CSV 附件
pub(crate) fn respond_report(
    rows: Vec<ReportRow>,
    rubric_columns: &[ManualGradingRubric],
    csv: bool,
    file_stem: &str,
) -> HttpResponse {
    if !csv {
        return HttpResponse::Ok().json(ApiResponse::success(
            ReportResponse {
                rows,
                generated_at: Utc::now(),
            },
            "Report generated successfully",
        ));
    }

    match render_csv(&rows, rubric_columns) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{file_stem}.csv\""),
            ))
            .body(bytes),
        Err(e) => internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to render report: {e}"),
        ),
    }
}

pub async fn assignment_report(
    service: &AssignmentService,
    request: &HttpRequest,
    query: ReportQuery,
) -> ActixResult<HttpResponse> {
    let assignment = match require_extension::<Assignment>(request, "assignment") {
        Ok(assignment) => assignment,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let collected = async {
        let teams = storage.list_teams(assignment.classroom_id).await?;
        assignment_rows(storage.as_ref(), &assignment, &teams).await
    }
    .await;

    match collected {
        Ok((rows, rubrics)) => Ok(respond_report(
            rows,
            &rubrics,
            query.wants_csv(),
            &format!("assignment-{}", assignment.id),
        )),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to build assignment report: {e}"),
        )),
    }
}
