use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

/// 人工评分细则，属于课堂，可挂到多个作业上
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct ManualGradingRubric {
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub name: String,
    pub description: String,
    pub max_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 某个作业项目在某条细则上的得分，(rubric_id, assignment_project_id) 唯一
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct ManualGradingResult {
    pub id: Uuid,
    pub rubric_id: Uuid,
    pub assignment_project_id: Uuid,
    pub score: i32,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
