//! 基于 reqwest 的 GitLab REST v4 客户端

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::models::{
    AccessLevel, GitLabGroup, GitLabProject, GitLabUser, GroupAccessToken, Pipeline,
    ProjectMember, Runner, TestReportSummary,
};
use super::{GitLabApi, GitLabError, GitLabProvider, GitLabResult};
use crate::config::AppConfig;
use crate::models::classrooms::entities::Classroom;

/// 单页最多返回条数（GitLab 上限为 100）
const PER_PAGE: &str = "100";

pub struct GitLabClient {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl GitLabClient {
    /// `base_url` 为 API 根地址，例如 `https://gitlab.example.org/api/v4`
    pub fn new(http: reqwest::Client, base_url: &str, token: SecretString) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(self.url(path))
            .bearer_auth(self.token.expose_secret())
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(self.url(path))
            .bearer_auth(self.token.expose_secret())
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.http
            .put(self.url(path))
            .bearer_auth(self.token.expose_secret())
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.http
            .delete(self.url(path))
            .bearer_auth(self.token.expose_secret())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> GitLabResult<T> {
        let resp = request.send().await?;
        let resp = check_status(resp).await?;
        resp.json::<T>()
            .await
            .map_err(|e| GitLabError::Decode(e.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> GitLabResult<()> {
        let resp = request.send().await?;
        check_status(resp).await?;
        Ok(())
    }
}

/// 非 2xx 响应转换为带状态码的错误
async fn check_status(resp: reqwest::Response) -> GitLabResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    debug!("GitLab responded {}: {}", status, body);
    Err(GitLabError::api(status.as_u16(), error_message(status, &body)))
}

/// GitLab 的错误体可能是 `{"message": ...}`、`{"error": ...}` 或纯文本
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) => return s.clone(),
                Some(other) if !other.is_null() => return other.to_string(),
                _ => {}
            }
        }
    }
    if body.trim().is_empty() {
        status.to_string()
    } else {
        body.trim().to_string()
    }
}

/// 由名称生成 GitLab 路径，附加随机后缀避免重名
pub fn path_from_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "classroom" } else { slug };
    let suffix: [u8; 3] = rand::random();
    format!("{}-{}", slug, hex::encode(suffix))
}

#[async_trait]
impl GitLabApi for GitLabClient {
    async fn get_current_user(&self) -> GitLabResult<GitLabUser> {
        self.send_json(self.get("/user")).await
    }

    async fn get_group_by_id(&self, group_id: i64) -> GitLabResult<GitLabGroup> {
        self.send_json(self.get(&format!("/groups/{group_id}")))
            .await
    }

    async fn create_group(&self, name: &str, description: &str) -> GitLabResult<GitLabGroup> {
        self.send_json(self.post("/groups").json(&json!({
            "name": name,
            "path": path_from_name(name),
            "description": description,
            "visibility": "private",
        })))
        .await
    }

    async fn create_sub_group(
        &self,
        name: &str,
        parent_id: i64,
        description: &str,
    ) -> GitLabResult<GitLabGroup> {
        self.send_json(self.post("/groups").json(&json!({
            "name": name,
            "path": path_from_name(name),
            "parent_id": parent_id,
            "description": description,
            "visibility": "private",
        })))
        .await
    }

    async fn change_group_name(&self, group_id: i64, name: &str) -> GitLabResult<GitLabGroup> {
        self.send_json(
            self.put(&format!("/groups/{group_id}"))
                .json(&json!({ "name": name })),
        )
        .await
    }

    async fn change_group_description(
        &self,
        group_id: i64,
        description: &str,
    ) -> GitLabResult<GitLabGroup> {
        self.send_json(
            self.put(&format!("/groups/{group_id}"))
                .json(&json!({ "description": description })),
        )
        .await
    }

    async fn delete_group(&self, group_id: i64) -> GitLabResult<()> {
        self.send_empty(self.delete(&format!("/groups/{group_id}")))
            .await
    }

    async fn add_user_to_group(
        &self,
        group_id: i64,
        user_id: i64,
        level: AccessLevel,
    ) -> GitLabResult<()> {
        self.send_empty(
            self.post(&format!("/groups/{group_id}/members"))
                .json(&json!({ "user_id": user_id, "access_level": level.as_i32() })),
        )
        .await
    }

    async fn remove_user_from_group(&self, group_id: i64, user_id: i64) -> GitLabResult<()> {
        self.send_empty(self.delete(&format!("/groups/{group_id}/members/{user_id}")))
            .await
    }

    async fn get_access_level_of_user_in_project(
        &self,
        project_id: i64,
        user_id: i64,
    ) -> GitLabResult<AccessLevel> {
        let result: GitLabResult<ProjectMember> = self
            .send_json(self.get(&format!("/projects/{project_id}/members/all/{user_id}")))
            .await;
        match result {
            Ok(member) => Ok(member.access_level),
            Err(e) if e.is_not_found() => Ok(AccessLevel::NoPermissions),
            Err(e) => Err(e),
        }
    }

    async fn remove_user_from_project(&self, project_id: i64, user_id: i64) -> GitLabResult<()> {
        self.send_empty(self.delete(&format!("/projects/{project_id}/members/{user_id}")))
            .await
    }

    async fn change_user_access_level_in_project(
        &self,
        project_id: i64,
        user_id: i64,
        level: AccessLevel,
    ) -> GitLabResult<()> {
        let updated = self
            .send_empty(
                self.put(&format!("/projects/{project_id}/members/{user_id}"))
                    .json(&json!({ "access_level": level.as_i32() })),
            )
            .await;
        match updated {
            // 只有继承的成员关系时需要先成为项目直接成员
            Err(e) if e.is_not_found() => {
                self.send_empty(
                    self.post(&format!("/projects/{project_id}/members"))
                        .json(&json!({ "user_id": user_id, "access_level": level.as_i32() })),
                )
                .await
            }
            other => other,
        }
    }

    async fn create_group_access_token(
        &self,
        group_id: i64,
        name: &str,
        level: AccessLevel,
        expires_at: NaiveDate,
    ) -> GitLabResult<GroupAccessToken> {
        self.send_json(
            self.post(&format!("/groups/{group_id}/access_tokens"))
                .json(&json!({
                    "name": name,
                    "scopes": ["api"],
                    "access_level": level.as_i32(),
                    "expires_at": expires_at.format("%Y-%m-%d").to_string(),
                })),
        )
        .await
    }

    async fn rotate_group_access_token(
        &self,
        group_id: i64,
        token_id: i64,
        expires_at: NaiveDate,
    ) -> GitLabResult<GroupAccessToken> {
        self.send_json(
            self.post(&format!(
                "/groups/{group_id}/access_tokens/{token_id}/rotate"
            ))
            .json(&json!({ "expires_at": expires_at.format("%Y-%m-%d").to_string() })),
        )
        .await
    }

    async fn fork_project(
        &self,
        project_id: i64,
        namespace_id: i64,
        name: &str,
        description: &str,
    ) -> GitLabResult<GitLabProject> {
        self.send_json(self.post(&format!("/projects/{project_id}/fork")).json(&json!({
            "namespace_id": namespace_id,
            "name": name,
            "path": path_from_name(name),
            "description": description,
        })))
        .await
    }

    async fn get_project_by_id(&self, project_id: i64) -> GitLabResult<GitLabProject> {
        self.send_json(self.get(&format!("/projects/{project_id}")))
            .await
    }

    async fn get_all_projects(&self, search: &str) -> GitLabResult<Vec<GitLabProject>> {
        self.send_json(self.get("/projects").query(&[
            ("search", search),
            ("membership", "true"),
            ("simple", "true"),
            ("per_page", PER_PAGE),
        ]))
        .await
    }

    async fn get_project_latest_pipeline(
        &self,
        project_id: i64,
        git_ref: Option<&str>,
    ) -> GitLabResult<Pipeline> {
        let mut request = self.get(&format!("/projects/{project_id}/pipelines/latest"));
        if let Some(git_ref) = git_ref {
            request = request.query(&[("ref", git_ref)]);
        }
        self.send_json(request).await
    }

    async fn get_project_latest_pipeline_test_report_summary(
        &self,
        project_id: i64,
        git_ref: Option<&str>,
    ) -> GitLabResult<TestReportSummary> {
        let pipeline = self.get_project_latest_pipeline(project_id, git_ref).await?;
        self.send_json(self.get(&format!(
            "/projects/{project_id}/pipelines/{}/test_report_summary",
            pipeline.id
        )))
        .await
    }

    async fn get_available_runners_for_gitlab(&self) -> GitLabResult<Vec<Runner>> {
        self.send_json(
            self.get("/runners")
                .query(&[("type", "instance_type"), ("per_page", PER_PAGE)]),
        )
        .await
    }

    async fn get_available_runners_for_group(&self, group_id: i64) -> GitLabResult<Vec<Runner>> {
        self.send_json(
            self.get(&format!("/groups/{group_id}/runners"))
                .query(&[("per_page", PER_PAGE)]),
        )
        .await
    }
}

/// 共享同一个 reqwest 连接池的客户端工厂
pub struct RestGitLabProvider {
    http: reqwest::Client,
    api_url: String,
}

impl RestGitLabProvider {
    pub fn new(api_url: &str, connect_timeout: u64, request_timeout: u64) -> GitLabResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GitLabError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_url: api_url.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> GitLabResult<Self> {
        Self::new(
            &config.gitlab_api_url(),
            config.gitlab.connect_timeout,
            config.gitlab.request_timeout,
        )
    }
}

impl GitLabProvider for RestGitLabProvider {
    fn for_user(&self, access_token: &SecretString) -> Arc<dyn GitLabApi> {
        Arc::new(GitLabClient::new(
            self.http.clone(),
            &self.api_url,
            SecretString::from(access_token.expose_secret().to_string()),
        ))
    }

    fn for_classroom(&self, classroom: &Classroom) -> Arc<dyn GitLabApi> {
        Arc::new(GitLabClient::new(
            self.http.clone(),
            &self.api_url,
            SecretString::from(classroom.group_access_token.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_slugged_with_suffix() {
        let path = path_from_name("Software Engineering 2025 / WS");
        assert!(path.starts_with("software-engineering-2025-ws-"));
        assert_eq!(path.len(), "software-engineering-2025-ws-".len() + 6);
    }

    #[test]
    fn empty_names_get_a_fallback_path() {
        assert!(path_from_name("   ").starts_with("classroom-"));
    }

    #[test]
    fn error_message_prefers_json_message() {
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, r#"{"message":"404 Project Not Found"}"#),
            "404 Project Not Found"
        );
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"message":{"name":["has already been taken"]}}"#
            ),
            r#"{"name":["has already been taken"]}"#
        );
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, r#"{"error":"invalid_token"}"#),
            "invalid_token"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, ""),
            "502 Bad Gateway"
        );
    }
}
