use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::gitlab::TestReportSummary;

// 团队作业项目状态：邀请后为 pending，fork 过程中为 creating，完成后为 accepted
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/project.ts")]
pub enum ProjectStatus {
    Pending,
    Creating,
    Accepted,
}

impl<'de> Deserialize<'de> for ProjectStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl ProjectStatus {
    pub fn is_accepted(self) -> bool {
        self == ProjectStatus::Accepted
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Pending => write!(f, "pending"),
            ProjectStatus::Creating => write!(f, "creating"),
            ProjectStatus::Accepted => write!(f, "accepted"),
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProjectStatus::Pending),
            "creating" => Ok(ProjectStatus::Creating),
            "accepted" => Ok(ProjectStatus::Accepted),
            _ => Err(format!("Invalid project status: {s}")),
        }
    }
}

/// 团队在某个作业下的项目
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/project.ts")]
pub struct AssignmentProject {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub team_id: Uuid,
    pub project_status: ProjectStatus,
    pub gitlab_project_id: Option<i64>,
    pub gitlab_web_url: Option<String>,
    /// 最近一次拉取的 JUnit 测试汇总
    pub junit_test_result: Option<TestReportSummary>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
