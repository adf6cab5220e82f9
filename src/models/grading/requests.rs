use serde::Deserialize;
use ts_rs::TS;
use uuid::Uuid;

use super::entities::ManualGradingRubric;
use crate::models::ErrorCode;

// 创建和更新细则共用
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct RubricRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_score: i32,
}

impl RubricRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("request requires a rubric name");
        }
        if self.max_score <= 0 {
            return Err("max_score must be positive");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct GradingResultInput {
    pub rubric_id: Uuid,
    pub score: i32,
    pub feedback: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct UpdateGradingResultsRequest {
    #[serde(default)]
    pub results: Vec<GradingResultInput>,
}

impl UpdateGradingResultsRequest {
    /// 每条结果都必须对应作业挂载的细则，且分数落在 [0, max_score]
    pub fn validate(&self, rubrics: &[ManualGradingRubric]) -> Result<(), (ErrorCode, String)> {
        if self.results.is_empty() {
            return Err((
                ErrorCode::BadRequest,
                "request requires at least one result".to_string(),
            ));
        }
        for input in &self.results {
            let Some(rubric) = rubrics.iter().find(|r| r.id == input.rubric_id) else {
                return Err((
                    ErrorCode::RubricNotFound,
                    format!("rubric {} is not part of this assignment", input.rubric_id),
                ));
            };
            if input.score < 0 || input.score > rubric.max_score {
                return Err((
                    ErrorCode::ScoreOutOfRange,
                    format!(
                        "score for '{}' must be between 0 and {}",
                        rubric.name, rubric.max_score
                    ),
                ));
            }
        }
        Ok(())
    }
}
