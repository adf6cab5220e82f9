use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::ClassroomService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{access_levels, classroom_context, internal_error};

/// 已归档时直接返回 204；否则把学生降为 Reporter，全部成功后才写入归档标志
pub async fn archive_classroom(
    service: &ClassroomService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    if ctx.classroom.archived {
        return Ok(HttpResponse::NoContent().finish());
    }
    let storage = service.get_storage(request);

    match access_levels::archive_classroom(storage.as_ref(), &ctx.gitlab, &ctx.classroom).await {
        Ok(()) => Ok(HttpResponse::Accepted().json(ApiResponse::success_empty(
            "Classroom archived successfully",
        ))),
        Err(e) => {
            error!("Archiving classroom {} failed: {}", ctx.classroom.id, e);
            Ok(internal_error(
                ErrorCode::ClassroomArchiveFailed,
                format!("Classroom archive failed: {e}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::AccessLevel;
    use crate::services::test_support::Fixture;
    use actix_web::http::StatusCode;

    /// 两个团队各有一个已接受项目，共三名学生，初始为 Developer
    async fn populated() -> Fixture {
        let fx = Fixture::new().await;
        let red = fx.team("red", &[11, 12]).await;
        let blue = fx.team("blue", &[13]).await;
        let assignment = fx.assignment(None).await;
        fx.accepted_project(&assignment, &red, 900).await;
        fx.accepted_project(&assignment, &blue, 901).await;
        for (project, user) in [(900, 11), (900, 12), (901, 13)] {
            fx.fake.set_access_level(project, user, AccessLevel::Developer);
        }
        fx
    }

    #[actix_web::test]
    async fn already_archived_returns_no_content_without_side_effects() {
        let fx = populated().await;
        fx.storage
            .set_classroom_archived(fx.classroom.id, true)
            .await
            .unwrap();
        let req = fx.owner_request().await;
        let calls_before = fx.fake.calls().len();

        let resp = archive_classroom(&ClassroomService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(fx.fake.calls().len(), calls_before);
        assert_eq!(fx.fake.access_level(900, 11), AccessLevel::Developer);
    }

    #[actix_web::test]
    async fn failure_rolls_back_earlier_demotions() {
        let fx = populated().await;
        fx.fake.fail_on("change_user_access_level_in_project", 2);
        let req = fx.owner_request().await;

        let resp = archive_classroom(&ClassroomService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        for (project, user) in [(900, 11), (900, 12), (901, 13)] {
            assert_eq!(fx.fake.access_level(project, user), AccessLevel::Developer);
        }
        assert!(!fx.reload_classroom().await.archived);
    }

    #[actix_web::test]
    async fn success_demotes_every_student_and_archives() {
        let fx = populated().await;
        let req = fx.owner_request().await;

        let resp = archive_classroom(&ClassroomService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        for (project, user) in [(900, 11), (900, 12), (901, 13)] {
            assert_eq!(fx.fake.access_level(project, user), AccessLevel::Reporter);
        }
        assert!(fx.reload_classroom().await.archived);
    }
}
