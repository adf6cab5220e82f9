use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{Duration, Utc};
use tracing::{info, warn};

use super::InvitationService;
use crate::models::{ApiResponse, ErrorCode, invitations::requests::CreateInvitationsRequest};
use crate::services::{bad_request, classroom_context, get_mailer, internal_error};

pub async fn create_invitations(
    service: &InvitationService,
    request: &HttpRequest,
    body: CreateInvitationsRequest,
) -> ActixResult<HttpResponse> {
    let ctx = match classroom_context(request) {
        Ok(ctx) => ctx,
        Err(resp) => return Ok(resp),
    };
    let emails = match body.validate() {
        Ok(emails) => emails,
        Err(msg) => return Ok(bad_request(msg)),
    };
    let storage = service.get_storage(request);
    let expiry_date = Utc::now() + Duration::days(body.expiry_days());

    let invitations = match storage
        .create_invitations(ctx.classroom.id, &emails, expiry_date)
        .await
    {
        Ok(invitations) => invitations,
        Err(e) => {
            return Ok(internal_error(
                ErrorCode::InvitationCreationFailed,
                format!("Failed to create invitations: {e}"),
            ));
        }
    };

    // 邮件发送失败不回滚邀请，管理者可以在列表中看到并重新通知
    let mailer = get_mailer(request);
    for invitation in &invitations {
        if let Err(e) = mailer
            .send_classroom_invitation(&ctx.classroom, invitation)
            .await
        {
            warn!("Failed to send invitation {}: {}", invitation.id, e);
        }
    }

    info!(
        "Classroom {}: {} invitations created",
        ctx.classroom.id,
        invitations.len()
    );
    Ok(HttpResponse::Created().json(ApiResponse::success(
        invitations,
        "Invitations created successfully",
    )))
}
