pub mod archive;
pub mod create;
pub mod delete;
pub mod get;
pub mod gitlab;
pub mod list;
pub mod owned;
pub mod report;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::assignments::requests::ReportQuery;
use crate::models::classrooms::requests::{
    ClassroomQueryParams, CreateClassroomRequest, UpdateClassroomRequest,
};
use crate::models::common::PaginationQuery;
use crate::storage::Storage;

pub struct ClassroomService {
    storage: Option<Arc<dyn Storage>>,
}

impl ClassroomService {
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

    // 当前用户加入的课堂
    pub async fn list_classrooms(
        &self,
        request: &HttpRequest,
        query: ClassroomQueryParams,
    ) -> ActixResult<HttpResponse> {
        list::list_classrooms(self, request, query).await
    }

    pub async fn create_classroom(
        &self,
        request: &HttpRequest,
        body: CreateClassroomRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_classroom(self, request, body).await
    }

    // 当前用户创建的课堂
    pub async fn list_owned_classrooms(
        &self,
        request: &HttpRequest,
        query: PaginationQuery,
    ) -> ActixResult<HttpResponse> {
        owned::list_owned_classrooms(self, request, query).await
    }

    pub async fn get_owned_classroom(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        owned::get_owned_classroom(self, request).await
    }

    pub async fn get_classroom(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_classroom(self, request).await
    }

    pub async fn update_classroom(
        &self,
        request: &HttpRequest,
        body: UpdateClassroomRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_classroom(self, request, body).await
    }

    // 归档课堂，学生降为 Reporter
    pub async fn archive_classroom(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        archive::archive_classroom(self, request).await
    }

    pub async fn delete_classroom(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        delete::delete_classroom(self, request).await
    }

    pub async fn redirect_to_gitlab(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        gitlab::redirect_to_gitlab(self, request).await
    }

    pub async fn list_runners(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        gitlab::list_runners(self, request).await
    }

    // 全部作业的成绩报表
    pub async fn classroom_report(
        &self,
        request: &HttpRequest,
        query: ReportQuery,
    ) -> ActixResult<HttpResponse> {
        report::classroom_report(self, request, query).await
    }
}
