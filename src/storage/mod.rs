use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::gitlab::TestReportSummary;
use crate::models::{
    PaginatedResponse,
    assignments::{
        entities::Assignment,
        requests::{NewAssignment, UpdateAssignmentRequest},
    },
    classrooms::{
        entities::Classroom,
        requests::{ClassroomListFilter, NewClassroom},
        responses::ClassroomListResponse,
    },
    grading::{
        entities::{ManualGradingResult, ManualGradingRubric},
        requests::{GradingResultInput, RubricRequest},
    },
    invitations::entities::{ClassroomInvitation, InvitationStatus},
    projects::entities::{AssignmentProject, ProjectStatus},
    teams::entities::{Team, TeamWithMembers},
    user_classrooms::entities::{ClassroomMember, Role, UserClassroom},
    users::{entities::User, requests::UpsertUserRequest},
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 按配置创建存储后端并运行迁移
pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户
    // 登录时根据 GitLab 资料创建或更新用户
    async fn upsert_user(&self, user: UpsertUserRequest) -> Result<User>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// 课堂
    // 创建课堂，同一事务内写入创建者的 Owner 成员关系
    async fn create_classroom(&self, classroom: NewClassroom) -> Result<Classroom>;
    async fn get_classroom_by_id(&self, classroom_id: Uuid) -> Result<Option<Classroom>>;
    // 用户加入的课堂（按角色和归档状态过滤）
    async fn list_user_classrooms(
        &self,
        user_id: i64,
        filter: ClassroomListFilter,
    ) -> Result<ClassroomListResponse>;
    // 用户创建的课堂
    async fn list_owned_classrooms(
        &self,
        owner_id: i64,
        page: u64,
        size: u64,
    ) -> Result<ClassroomListResponse>;
    async fn update_classroom(
        &self,
        classroom_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Option<Classroom>>;
    async fn set_classroom_archived(&self, classroom_id: Uuid, archived: bool) -> Result<bool>;
    async fn set_classroom_potentially_deleted(
        &self,
        classroom_id: Uuid,
        potentially_deleted: bool,
    ) -> Result<bool>;
    // 保存轮换后的组访问令牌
    async fn update_classroom_token(
        &self,
        classroom_id: Uuid,
        token_id: i64,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Option<Classroom>>;
    async fn delete_classroom(&self, classroom_id: Uuid) -> Result<bool>;

    /// 成员
    async fn get_membership(
        &self,
        classroom_id: Uuid,
        user_id: i64,
    ) -> Result<Option<UserClassroom>>;
    async fn get_member(&self, classroom_id: Uuid, user_id: i64)
    -> Result<Option<ClassroomMember>>;
    async fn list_members(
        &self,
        classroom_id: Uuid,
        role: Option<Role>,
        page: u64,
        size: u64,
    ) -> Result<PaginatedResponse<ClassroomMember>>;
    async fn list_all_members(&self, classroom_id: Uuid) -> Result<Vec<ClassroomMember>>;
    async fn add_member(
        &self,
        classroom_id: Uuid,
        user_id: i64,
        role: Role,
    ) -> Result<UserClassroom>;
    async fn update_member_role(
        &self,
        classroom_id: Uuid,
        user_id: i64,
        role: Role,
    ) -> Result<Option<UserClassroom>>;
    // 团队必须属于同一课堂
    async fn update_member_team(
        &self,
        classroom_id: Uuid,
        user_id: i64,
        team_id: Option<Uuid>,
    ) -> Result<Option<UserClassroom>>;
    async fn remove_member(&self, classroom_id: Uuid, user_id: i64) -> Result<bool>;

    /// 团队
    async fn create_team(
        &self,
        classroom_id: Uuid,
        name: &str,
        group_id: i64,
        gitlab_web_url: &str,
    ) -> Result<Team>;
    async fn get_team(&self, classroom_id: Uuid, team_id: Uuid) -> Result<Option<Team>>;
    async fn list_teams(&self, classroom_id: Uuid) -> Result<Vec<TeamWithMembers>>;
    async fn count_teams(&self, classroom_id: Uuid) -> Result<u64>;
    async fn count_team_members(&self, team_id: Uuid) -> Result<u64>;
    async fn list_team_members(&self, team_id: Uuid) -> Result<Vec<ClassroomMember>>;
    async fn rename_team(&self, team_id: Uuid, name: &str) -> Result<Option<Team>>;
    async fn delete_team(&self, team_id: Uuid) -> Result<bool>;

    /// 作业
    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment>;
    async fn get_assignment(
        &self,
        classroom_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Option<Assignment>>;
    async fn list_assignments(&self, classroom_id: Uuid) -> Result<Vec<Assignment>>;
    async fn update_assignment(
        &self,
        assignment_id: Uuid,
        update: &UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>>;
    async fn set_assignment_closed(&self, assignment_id: Uuid, closed: bool) -> Result<bool>;
    // 截止时间已过但仍未关闭的作业
    async fn list_due_open_assignments(&self, now: DateTime<Utc>) -> Result<Vec<Assignment>>;
    // 用给定细则替换作业的细则集合
    async fn set_assignment_rubrics(&self, assignment_id: Uuid, rubric_ids: &[Uuid])
    -> Result<()>;
    async fn list_assignment_rubrics(&self, assignment_id: Uuid)
    -> Result<Vec<ManualGradingRubric>>;

    /// 作业项目
    // 为团队批量创建 Pending 项目；只接受作业所在课堂的团队，已有项目的团队跳过
    async fn create_assignment_projects(
        &self,
        assignment_id: Uuid,
        team_ids: &[Uuid],
    ) -> Result<Vec<AssignmentProject>>;
    async fn get_assignment_project(
        &self,
        classroom_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<AssignmentProject>>;
    async fn get_assignment_project_by_team(
        &self,
        assignment_id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<AssignmentProject>>;
    async fn list_assignment_projects(&self, assignment_id: Uuid)
    -> Result<Vec<AssignmentProject>>;
    async fn list_accepted_projects_by_classroom(
        &self,
        classroom_id: Uuid,
    ) -> Result<Vec<AssignmentProject>>;
    async fn list_accepted_projects_by_team(
        &self,
        team_id: Uuid,
        open_only: bool,
    ) -> Result<Vec<AssignmentProject>>;
    // 条件更新 Pending → Creating，返回是否抢占成功
    async fn claim_pending_project(&self, project_id: Uuid) -> Result<bool>;
    async fn update_project_status(
        &self,
        project_id: Uuid,
        status: ProjectStatus,
        gitlab_project_id: Option<i64>,
        gitlab_web_url: Option<String>,
    ) -> Result<Option<AssignmentProject>>;
    async fn update_junit_result(
        &self,
        project_id: Uuid,
        summary: &TestReportSummary,
    ) -> Result<bool>;
    async fn assignment_has_accepted_projects(&self, assignment_id: Uuid) -> Result<bool>;
    async fn team_has_accepted_projects(&self, team_id: Uuid) -> Result<bool>;

    /// 邀请
    async fn create_invitations(
        &self,
        classroom_id: Uuid,
        emails: &[String],
        expiry_date: DateTime<Utc>,
    ) -> Result<Vec<ClassroomInvitation>>;
    async fn get_invitation(&self, invitation_id: Uuid) -> Result<Option<ClassroomInvitation>>;
    async fn list_invitations(&self, classroom_id: Uuid) -> Result<Vec<ClassroomInvitation>>;
    async fn update_invitation_status(
        &self,
        invitation_id: Uuid,
        status: InvitationStatus,
    ) -> Result<Option<ClassroomInvitation>>;
    // 同一事务内把邀请标记为已接受并加入学生成员关系
    async fn accept_invitation(&self, invitation_id: Uuid, user_id: i64)
    -> Result<UserClassroom>;

    /// 评分细则
    async fn create_rubric(
        &self,
        classroom_id: Uuid,
        rubric: &RubricRequest,
    ) -> Result<ManualGradingRubric>;
    async fn get_rubric(
        &self,
        classroom_id: Uuid,
        rubric_id: Uuid,
    ) -> Result<Option<ManualGradingRubric>>;
    async fn list_rubrics(&self, classroom_id: Uuid) -> Result<Vec<ManualGradingRubric>>;
    async fn update_rubric(
        &self,
        rubric_id: Uuid,
        rubric: &RubricRequest,
    ) -> Result<Option<ManualGradingRubric>>;
    async fn delete_rubric(&self, rubric_id: Uuid) -> Result<bool>;

    /// 评分结果
    async fn upsert_grading_results(
        &self,
        assignment_project_id: Uuid,
        results: &[GradingResultInput],
    ) -> Result<Vec<ManualGradingResult>>;
    async fn list_grading_results(
        &self,
        assignment_project_id: Uuid,
    ) -> Result<Vec<ManualGradingResult>>;
    async fn list_assignment_grading_results(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<ManualGradingResult>>;
}
