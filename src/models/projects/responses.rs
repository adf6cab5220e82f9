use serde::Serialize;
use ts_rs::TS;

use super::entities::AssignmentProject;
use crate::gitlab::{Pipeline, TestReportSummary};
use crate::models::assignments::entities::Assignment;
use crate::models::grading::entities::ManualGradingResult;
use crate::models::teams::entities::TeamWithMembers;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/project.ts")]
pub struct AssignmentProjectDetail {
    pub project: AssignmentProject,
    pub assignment: Assignment,
    pub team: TeamWithMembers,
    pub grading_results: Vec<ManualGradingResult>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/project.ts")]
pub struct PipelineResponse {
    pub pipeline: Pipeline,
    pub test_report: TestReportSummary,
}

/// 拉取 JUnit 结果的汇总
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/project.ts")]
pub struct JunitPullResponse {
    pub updated: usize,
    /// 还没有流水线或测试报告的项目
    pub missing: usize,
}
