use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::TeamService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{classroom_context, internal_error};

pub async fn list_teams(
    service: &TeamService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    match storage.list_teams(ctx.classroom.id).await {
        Ok(teams) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            teams,
            "Team list retrieved successfully",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            format!("Failed to retrieve teams: {e}"),
        )),
    }
}
