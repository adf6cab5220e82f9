//! 成绩报表
//!
//! 报表按 (作业, 团队) 展开为行，JSON 直接返回，CSV 每条细则一列。

use std::collections::HashMap;

use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

use crate::models::assignments::entities::Assignment;
use crate::models::grading::entities::{ManualGradingResult, ManualGradingRubric};
use crate::models::projects::entities::{AssignmentProject, ProjectStatus};
use crate::models::teams::entities::TeamWithMembers;

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct RubricScore {
    pub rubric_id: Uuid,
    pub rubric_name: String,
    pub score: Option<i32>,
    pub max_score: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct ReportRow {
    pub assignment_id: Uuid,
    pub assignment_name: String,
    pub team_id: Uuid,
    pub team_name: String,
    pub members: Vec<String>,
    /// 团队没有被邀请到该作业时为空
    pub project_status: Option<ProjectStatus>,
    pub gitlab_web_url: Option<String>,
    pub junit_passed: Option<i64>,
    pub junit_total: Option<i64>,
    pub rubric_scores: Vec<RubricScore>,
    pub manual_score: i32,
    pub manual_max: i32,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/report.ts")]
pub struct ReportResponse {
    pub rows: Vec<ReportRow>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// 作业报表所需的全部数据
pub struct AssignmentReportInput<'a> {
    pub assignment: &'a Assignment,
    pub teams: &'a [TeamWithMembers],
    pub projects: &'a [AssignmentProject],
    pub rubrics: &'a [ManualGradingRubric],
    pub results: &'a [ManualGradingResult],
}

pub fn build_assignment_rows(input: &AssignmentReportInput<'_>) -> Vec<ReportRow> {
    let projects_by_team: HashMap<Uuid, &AssignmentProject> =
        input.projects.iter().map(|p| (p.team_id, p)).collect();
    let manual_max: i32 = input.rubrics.iter().map(|r| r.max_score).sum();

    input
        .teams
        .iter()
        .map(|team| {
            let project = projects_by_team.get(&team.team.id).copied();
            let rubric_scores: Vec<RubricScore> = input
                .rubrics
                .iter()
                .map(|rubric| RubricScore {
                    rubric_id: rubric.id,
                    rubric_name: rubric.name.clone(),
                    score: project.and_then(|p| {
                        input
                            .results
                            .iter()
                            .find(|r| r.rubric_id == rubric.id && r.assignment_project_id == p.id)
                            .map(|r| r.score)
                    }),
                    max_score: rubric.max_score,
                })
                .collect();
            let junit = project.and_then(|p| p.junit_test_result.as_ref());

            ReportRow {
                assignment_id: input.assignment.id,
                assignment_name: input.assignment.name.clone(),
                team_id: team.team.id,
                team_name: team.team.name.clone(),
                members: team.members.iter().map(|m| m.user.username.clone()).collect(),
                project_status: project.map(|p| p.project_status),
                gitlab_web_url: project.and_then(|p| p.gitlab_web_url.clone()),
                junit_passed: junit.map(|j| j.total.success),
                junit_total: junit.map(|j| j.total.count),
                manual_score: rubric_scores.iter().filter_map(|s| s.score).sum(),
                manual_max,
                rubric_scores,
            }
        })
        .collect()
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// 渲染 CSV；`rubric_columns` 非空时为每条细则追加一列
pub fn render_csv(rows: &[ReportRow], rubric_columns: &[ManualGradingRubric]) -> Result<Vec<u8>, String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = [
        "assignment",
        "team",
        "members",
        "status",
        "project_url",
        "junit_passed",
        "junit_total",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(rubric_columns.iter().map(|r| r.name.clone()));
    header.push("manual_score".to_string());
    header.push("manual_max".to_string());
    wtr.write_record(&header)
        .map_err(|e| format!("CSV 写入失败: {e}"))?;

    for row in rows {
        let mut record = vec![
            row.assignment_name.clone(),
            row.team_name.clone(),
            row.members.join(";"),
            opt_to_string(row.project_status),
            row.gitlab_web_url.clone().unwrap_or_default(),
            opt_to_string(row.junit_passed),
            opt_to_string(row.junit_total),
        ];
        for rubric in rubric_columns {
            let score = row
                .rubric_scores
                .iter()
                .find(|s| s.rubric_id == rubric.id)
                .and_then(|s| s.score);
            record.push(opt_to_string(score));
        }
        record.push(row.manual_score.to_string());
        record.push(row.manual_max.to_string());
        wtr.write_record(&record)
            .map_err(|e| format!("CSV 写入失败: {e}"))?;
    }

    wtr.into_inner().map_err(|e| format!("CSV 生成失败: {e}"))
}
