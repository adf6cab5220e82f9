use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::ClassroomService;
use crate::middlewares::ClassroomContext;
use crate::models::{
    ApiResponse, classrooms::entities::Classroom, classrooms::responses::UserClassroomResponse,
    user_classrooms::policies::is_owner,
};
use crate::services::classroom_context;
use crate::storage::Storage;

pub async fn get_classroom(
    service: &ClassroomService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let classroom = if is_owner(&ctx.membership) {
        reconcile(storage.as_ref(), &ctx).await
    } else {
        ctx.classroom
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserClassroomResponse {
            classroom,
            role: ctx.membership.role,
            team_id: ctx.membership.team_id,
        },
        "Classroom retrieved successfully",
    )))
}

/// 检查 GitLab 组是否还在：组返回 404 时标记课堂可能已被删除，组恢复后清除标记
pub(crate) async fn reconcile(storage: &dyn Storage, ctx: &ClassroomContext) -> Classroom {
    let mut classroom = ctx.classroom.clone();
    let missing = match ctx.gitlab.get_group_by_id(classroom.gitlab_group_id).await {
        Ok(_) => false,
        Err(e) if e.is_not_found() => true,
        Err(e) => {
            warn!(
                "Could not check GitLab group {} of classroom {}: {}",
                classroom.gitlab_group_id, classroom.id, e
            );
            return classroom;
        }
    };
    if missing == classroom.potentially_deleted {
        return classroom;
    }

    match storage
        .set_classroom_potentially_deleted(classroom.id, missing)
        .await
    {
        Ok(_) => {
            info!(
                "Classroom {} potentially_deleted set to {}",
                classroom.id, missing
            );
            classroom.potentially_deleted = missing;
        }
        Err(e) => warn!("Failed to update classroom {}: {}", classroom.id, e),
    }
    classroom
}
