pub mod get;
pub mod grading;
pub mod pipeline;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::grading::requests::UpdateGradingResultsRequest;
use crate::storage::Storage;

pub struct ProjectService {
    storage: Option<Arc<dyn Storage>>,
}

impl ProjectService {
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

    pub async fn get_project(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_project(self, request).await
    }

    pub async fn redirect_to_gitlab(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::redirect_to_gitlab(self, request).await
    }

    // 最近一次流水线和测试报告摘要
    pub async fn get_pipeline(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        pipeline::get_pipeline(self, request).await
    }

    pub async fn update_grading_results(
        &self,
        request: &HttpRequest,
        body: UpdateGradingResultsRequest,
    ) -> ActixResult<HttpResponse> {
        grading::update_grading_results(self, request, body).await
    }
}
