pub mod accept;
pub mod create;
pub mod get;
pub mod invite;
pub mod junit;
pub mod list;
pub mod projects;
pub mod report;
pub mod rubrics;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::assignments::requests::{
    AssignRubricsRequest, CreateAssignmentRequest, InviteTeamsRequest, ReportQuery,
    UpdateAssignmentRequest,
};
use crate::storage::Storage;

pub struct AssignmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl AssignmentService {
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

    pub async fn list_assignments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_assignments(self, request).await
    }

    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        body: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_assignment(self, request, body).await
    }

    pub async fn get_assignment(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_assignment(self, request).await
    }

    // 更新作业；截止时间移到未来时重新开放
    pub async fn update_assignment(
        &self,
        request: &HttpRequest,
        body: UpdateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_assignment(self, request, body).await
    }

    // 邀请团队，为每个团队建立待接受的项目
    pub async fn invite_teams(
        &self,
        request: &HttpRequest,
        body: InviteTeamsRequest,
    ) -> ActixResult<HttpResponse> {
        invite::invite_teams(self, request, body).await
    }

    // 学生为自己的团队接受作业
    pub async fn accept_assignment(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        accept::accept_assignment(self, request).await
    }

    pub async fn list_projects(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        projects::list_projects(self, request).await
    }

    pub async fn list_rubrics(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        rubrics::list_assignment_rubrics(self, request).await
    }

    pub async fn assign_rubrics(
        &self,
        request: &HttpRequest,
        body: AssignRubricsRequest,
    ) -> ActixResult<HttpResponse> {
        rubrics::assign_rubrics(self, request, body).await
    }

    // 从最新流水线拉取 JUnit 测试结果
    pub async fn pull_junit_results(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        junit::pull_junit_results(self, request).await
    }

    pub async fn assignment_report(
        &self,
        request: &HttpRequest,
        query: ReportQuery,
    ) -> ActixResult<HttpResponse> {
        report::assignment_report(self, request, query).await
    }
}
