use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassroomService;
use crate::models::{ErrorCode, assignments::requests::ReportQuery};
use crate::services::assignments::report::{assignment_rows, respond_report};
use crate::services::{classroom_context, internal_error};

/// 课堂内所有作业的报表；CSV 不展开细则列（各作业细则不同）
pub async fn classroom_report(
    service: &ClassroomService,
    request: &HttpRequest,
    query: ReportQuery,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let collected = async {
        let teams = storage.list_teams(ctx.classroom.id).await?;
        let mut rows = Vec::new();
        for assignment in storage.list_assignments(ctx.classroom.id).await? {
            let (batch, _) = assignment_rows(storage.as_ref(), &assignment, &teams).await?;
            rows.extend(batch);
        }
        Ok::<_, crate::errors::GitClassroomsError>(rows)
    }
    .await;

    match collected {
        Ok(rows) => Ok(respond_report(
            rows,
            &[],
            query.wants_csv(),
            &format!("classroom-{}", ctx.classroom.id),
        )),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to build classroom report: {e}"),
        )),
    }
}
