//! GitLab 适配层
//!
//! [`GitLabApi`] 把本地领域操作映射为 GitLab REST v4 调用；
//! [`GitLabProvider`] 按身份（用户 OAuth 令牌或课堂组访问令牌）构造客户端。

pub mod client;
pub mod error;
pub mod models;
pub mod oauth;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::SecretString;
use std::sync::Arc;

pub use client::{GitLabClient, RestGitLabProvider};
pub use error::{GitLabError, GitLabResult};
pub use models::{
    AccessLevel, GitLabGroup, GitLabProject, GitLabUser, GroupAccessToken, Pipeline, Runner,
    TestReportSummary, TestReportTotal,
};
pub use oauth::{GitLabOAuth, OAuthToken};

use crate::models::classrooms::entities::Classroom;

#[async_trait]
pub trait GitLabApi: Send + Sync {
    async fn get_current_user(&self) -> GitLabResult<GitLabUser>;

    // 组
    async fn get_group_by_id(&self, group_id: i64) -> GitLabResult<GitLabGroup>;
    async fn create_group(&self, name: &str, description: &str) -> GitLabResult<GitLabGroup>;
    async fn create_sub_group(
        &self,
        name: &str,
        parent_id: i64,
        description: &str,
    ) -> GitLabResult<GitLabGroup>;
    async fn change_group_name(&self, group_id: i64, name: &str) -> GitLabResult<GitLabGroup>;
    async fn change_group_description(
        &self,
        group_id: i64,
        description: &str,
    ) -> GitLabResult<GitLabGroup>;
    async fn delete_group(&self, group_id: i64) -> GitLabResult<()>;

    // 成员
    async fn add_user_to_group(
        &self,
        group_id: i64,
        user_id: i64,
        level: AccessLevel,
    ) -> GitLabResult<()>;
    async fn remove_user_from_group(&self, group_id: i64, user_id: i64) -> GitLabResult<()>;
    /// 包含继承的成员关系；用户不在项目中时返回 `NoPermissions`
    async fn get_access_level_of_user_in_project(
        &self,
        project_id: i64,
        user_id: i64,
    ) -> GitLabResult<AccessLevel>;
    /// 只移除直接成员关系，继承自组的成员关系不受影响
    async fn remove_user_from_project(&self, project_id: i64, user_id: i64) -> GitLabResult<()>;
    /// 用户不是项目直接成员时会先添加
    async fn change_user_access_level_in_project(
        &self,
        project_id: i64,
        user_id: i64,
        level: AccessLevel,
    ) -> GitLabResult<()>;

    // 组访问令牌
    async fn create_group_access_token(
        &self,
        group_id: i64,
        name: &str,
        level: AccessLevel,
        expires_at: NaiveDate,
    ) -> GitLabResult<GroupAccessToken>;
    async fn rotate_group_access_token(
        &self,
        group_id: i64,
        token_id: i64,
        expires_at: NaiveDate,
    ) -> GitLabResult<GroupAccessToken>;

    // 项目
    async fn fork_project(
        &self,
        project_id: i64,
        namespace_id: i64,
        name: &str,
        description: &str,
    ) -> GitLabResult<GitLabProject>;
    async fn get_project_by_id(&self, project_id: i64) -> GitLabResult<GitLabProject>;
    async fn get_all_projects(&self, search: &str) -> GitLabResult<Vec<GitLabProject>>;

    // CI
    async fn get_project_latest_pipeline(
        &self,
        project_id: i64,
        git_ref: Option<&str>,
    ) -> GitLabResult<Pipeline>;
    async fn get_project_latest_pipeline_test_report_summary(
        &self,
        project_id: i64,
        git_ref: Option<&str>,
    ) -> GitLabResult<TestReportSummary>;
    async fn get_available_runners_for_gitlab(&self) -> GitLabResult<Vec<Runner>>;
    async fn get_available_runners_for_group(&self, group_id: i64) -> GitLabResult<Vec<Runner>>;
}

/// 构造 GitLab 客户端，放在 app_data 中共享
pub trait GitLabProvider: Send + Sync {
    /// 以登录用户的 OAuth 令牌访问
    fn for_user(&self, access_token: &SecretString) -> Arc<dyn GitLabApi>;
    /// 以课堂的组访问令牌访问
    fn for_classroom(&self, classroom: &Classroom) -> Arc<dyn GitLabApi>;
}
