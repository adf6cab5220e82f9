pub mod get;
pub mod list;
pub mod remove;
pub mod role;
pub mod team;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::user_classrooms::requests::{
    MemberListQuery, UpdateMemberRoleRequest, UpdateMemberTeamRequest,
};
use crate::storage::Storage;

pub struct MemberService {
    storage: Option<Arc<dyn Storage>>,
}

impl MemberService {
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

    pub async fn list_members(
        &self,
        request: &HttpRequest,
        query: MemberListQuery,
    ) -> ActixResult<HttpResponse> {
        list::list_members(self, request, query).await
    }

    pub async fn get_member(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_member(self, request).await
    }

    // 只有创建者可以修改角色
    pub async fn update_member_role(
        &self,
        request: &HttpRequest,
        body: UpdateMemberRoleRequest,
    ) -> ActixResult<HttpResponse> {
        role::update_member_role(self, request, body).await
    }

    pub async fn update_member_team(
        &self,
        request: &HttpRequest,
        body: UpdateMemberTeamRequest,
    ) -> ActixResult<HttpResponse> {
        team::update_member_team(self, request, body).await
    }

    pub async fn remove_member(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        remove::remove_member(self, request).await
    }
}
