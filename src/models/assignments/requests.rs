use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct CreateAssignmentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub template_project_id: i64,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub enable_junit_grading: bool,
}

impl CreateAssignmentRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("request requires a name");
        }
        if self.template_project_id <= 0 {
            return Err("request requires a template project");
        }
        if self.due_date.is_some_and(|due| due <= now) {
            return Err("due date must be in the future");
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct UpdateAssignmentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub enable_junit_grading: Option<bool>,
}

impl UpdateAssignmentRequest {
    pub fn changes_text(&self) -> bool {
        self.name.is_some() || self.description.is_some()
    }
}

// 存储层使用
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub classroom_id: Uuid,
    pub template_project_id: i64,
    pub name: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub enable_junit_grading: bool,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignRubricsRequest {
    pub rubric_ids: Vec<Uuid>,
}

// 报表格式
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct ReportQuery {
    pub format: Option<String>,
}

impl ReportQuery {
    pub fn wants_csv(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("csv"))
    }
}

/// `team_ids` 为空时邀请课堂内所有团队
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct InviteTeamsRequest {
    pub team_ids: Option<Vec<Uuid>>,
}
