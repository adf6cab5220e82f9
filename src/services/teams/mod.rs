pub mod create;
pub mod delete;
pub mod get;
pub mod join;
pub mod list;
pub mod rename;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::teams::requests::TeamNameRequest;
use crate::storage::Storage;

pub struct TeamService {
    storage: Option<Arc<dyn Storage>>,
}

impl TeamService {
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

    pub async fn list_teams(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_teams(self, request).await
    }

    // 学生创建时受 create_teams 限制，并自动加入
    pub async fn create_team(
        &self,
        request: &HttpRequest,
        body: TeamNameRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_team(self, request, body).await
    }

    pub async fn get_team(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_team(self, request).await
    }

    pub async fn redirect_to_gitlab(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::redirect_to_gitlab(self, request).await
    }

    pub async fn rename_team(
        &self,
        request: &HttpRequest,
        body: TeamNameRequest,
    ) -> ActixResult<HttpResponse> {
        rename::rename_team(self, request, body).await
    }

    pub async fn join_team(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        join::join_team(self, request).await
    }

    pub async fn delete_team(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        delete::delete_team(self, request).await
    }
}
