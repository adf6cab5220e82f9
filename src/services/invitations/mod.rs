pub mod answer;
pub mod create;
pub mod list;
pub mod revoke;
pub mod view;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::invitations::requests::CreateInvitationsRequest;
use crate::storage::Storage;

pub struct InvitationService {
    storage: Option<Arc<dyn Storage>>,
}

impl InvitationService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    /// 课堂管理者视角
    pub async fn create_invitations(
        &self,
        request: &HttpRequest,
        body: CreateInvitationsRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_invitations(self, request, body).await
    }

    pub async fn list_invitations(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_invitations(self, request).await
    }

    pub async fn revoke_invitation(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        revoke::revoke_invitation(self, request).await
    }

    /// 受邀者视角
    pub async fn view_invitation(
        &self,
        request: &HttpRequest,
        invitation_id: Uuid,
    ) -> ActixResult<HttpResponse> {
        view::view_invitation(self, request, invitation_id).await
    }

    pub async fn accept_invitation(
        &self,
        request: &HttpRequest,
        invitation_id: Uuid,
    ) -> ActixResult<HttpResponse> {
        answer::accept_invitation(self, request, invitation_id).await
    }

    pub async fn reject_invitation(
        &self,
        request: &HttpRequest,
        invitation_id: Uuid,
    ) -> ActixResult<HttpResponse> {
        answer::reject_invitation(self, request, invitation_id).await
    }
}
