pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::grading::requests::RubricRequest;
use crate::storage::Storage;

pub struct RubricService {
    storage: Option<Arc<dyn Storage>>,
}

impl RubricService {
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

    pub async fn list_rubrics(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_rubrics(self, request).await
    }

    pub async fn create_rubric(
        &self,
        request: &HttpRequest,
        body: RubricRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_rubric(self, request, body).await
    }

    pub async fn update_rubric(
        &self,
        request: &HttpRequest,
        body: RubricRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_rubric(self, request, body).await
    }

    pub async fn delete_rubric(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        delete::delete_rubric(self, request).await
    }
}
