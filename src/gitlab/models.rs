//! GitLab REST v4 资源类型（只保留用到的字段）

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

/// GitLab 成员访问级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessLevel {
    NoPermissions,
    Minimal,
    Guest,
    Reporter,
    Developer,
    Maintainer,
    Owner,
}

impl AccessLevel {
    pub fn as_i32(self) -> i32 {
        match self {
            AccessLevel::NoPermissions => 0,
            AccessLevel::Minimal => 5,
            AccessLevel::Guest => 10,
            AccessLevel::Reporter => 20,
            AccessLevel::Developer => 30,
            AccessLevel::Maintainer => 40,
            AccessLevel::Owner => 50,
        }
    }

    /// 未知数值向下取最近的已知级别
    pub fn from_i32(value: i32) -> Self {
        match value {
            v if v >= 50 => AccessLevel::Owner,
            v if v >= 40 => AccessLevel::Maintainer,
            v if v >= 30 => AccessLevel::Developer,
            v if v >= 20 => AccessLevel::Reporter,
            v if v >= 10 => AccessLevel::Guest,
            v if v >= 5 => AccessLevel::Minimal,
            _ => AccessLevel::NoPermissions,
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AccessLevel::NoPermissions => "no_permissions",
            AccessLevel::Minimal => "minimal",
            AccessLevel::Guest => "guest",
            AccessLevel::Reporter => "reporter",
            AccessLevel::Developer => "developer",
            AccessLevel::Maintainer => "maintainer",
            AccessLevel::Owner => "owner",
        };
        write!(f, "{name}")
    }
}

impl Serialize for AccessLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

impl<'de> Deserialize<'de> for AccessLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(AccessLevel::from_i32(i32::deserialize(deserializer)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabUser {
    pub id: i64,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub public_email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub web_url: String,
}

impl GitLabUser {
    /// `email` 只有本人或管理员可见，其余情况回落到公开邮箱
    pub fn primary_email(&self) -> String {
        self.email
            .clone()
            .filter(|e| !e.is_empty())
            .or_else(|| self.public_email.clone().filter(|e| !e.is_empty()))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabGroup {
    pub id: i64,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub full_path: String,
    #[serde(default)]
    pub description: Option<String>,
    pub web_url: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/gitlab.ts")]
pub struct GitLabProject {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub path_with_namespace: String,
    pub web_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMember {
    pub id: i64,
    pub username: String,
    pub access_level: AccessLevel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupAccessToken {
    pub id: i64,
    pub name: String,
    /// 只在创建和轮换的响应里返回
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/gitlab.ts")]
pub struct Pipeline {
    pub id: i64,
    pub status: String,
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
    pub web_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/gitlab.ts")]
pub struct TestReportTotal {
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub success: i64,
    #[serde(default)]
    pub failed: i64,
    #[serde(default)]
    pub skipped: i64,
    #[serde(default)]
    pub error: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/gitlab.ts")]
pub struct TestSuiteSummary {
    pub name: String,
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub success_count: i64,
    #[serde(default)]
    pub failed_count: i64,
    #[serde(default)]
    pub skipped_count: i64,
    #[serde(default)]
    pub error_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/gitlab.ts")]
pub struct TestReportSummary {
    #[serde(default)]
    pub total: TestReportTotal,
    #[serde(default)]
    pub test_suites: Vec<TestSuiteSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/gitlab.ts")]
pub struct Runner {
    pub id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub runner_type: String,
    #[serde(default)]
    pub online: Option<bool>,
    #[serde(default)]
    pub status: String,
}
