use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

/// 作业，以一个 GitLab 模板项目为蓝本
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct Assignment {
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub template_project_id: i64,
    pub name: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub closed: bool,
    pub enable_junit_grading: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| due <= now)
    }
}
