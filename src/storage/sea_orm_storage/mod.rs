//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignment_projects;
mod assignments;
mod classrooms;
mod grading;
mod invitations;
mod teams;
mod user_classrooms;
mod users;

use crate::config::AppConfig;
use crate::errors::{GitClassroomsError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| GitClassroomsError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// 使用已有连接（测试中用内存 SQLite）
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| GitClassroomsError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| GitClassroomsError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| GitClassroomsError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(GitClassroomsError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
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
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn upsert_user(&self, user: UpsertUserRequest) -> Result<User> {
        self.upsert_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    // 课堂模块
    async fn create_classroom(&self, classroom: NewClassroom) -> Result<Classroom> {
        self.create_classroom_impl(classroom).await
    }

    async fn get_classroom_by_id(&self, classroom_id: Uuid) -> Result<Option<Classroom>> {
        self.get_classroom_by_id_impl(classroom_id).await
    }

    async fn list_user_classrooms(
        &self,
        user_id: i64,
        filter: ClassroomListFilter,
    ) -> Result<ClassroomListResponse> {
        self.list_user_classrooms_impl(user_id, filter).await
    }

    async fn list_owned_classrooms(
        &self,
        owner_id: i64,
        page: u64,
        size: u64,
    ) -> Result<ClassroomListResponse> {
        self.list_owned_classrooms_impl(owner_id, page, size).await
    }

    async fn update_classroom(
        &self,
        classroom_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Option<Classroom>> {
        self.update_classroom_impl(classroom_id, name, description)
            .await
    }

    async fn set_classroom_archived(&self, classroom_id: Uuid, archived: bool) -> Result<bool> {
        self.set_classroom_archived_impl(classroom_id, archived).await
    }

    async fn set_classroom_potentially_deleted(
        &self,
        classroom_id: Uuid,
        potentially_deleted: bool,
    ) -> Result<bool> {
        self.set_classroom_potentially_deleted_impl(classroom_id, potentially_deleted)
            .await
    }

    async fn update_classroom_token(
        &self,
        classroom_id: Uuid,
        token_id: i64,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Option<Classroom>> {
        self.update_classroom_token_impl(classroom_id, token_id, token, created_at)
            .await
    }

    async fn delete_classroom(&self, classroom_id: Uuid) -> Result<bool> {
        self.delete_classroom_impl(classroom_id).await
    }

    // 成员模块
    async fn get_membership(
        &self,
        classroom_id: Uuid,
        user_id: i64,
    ) -> Result<Option<UserClassroom>> {
        self.get_membership_impl(classroom_id, user_id).await
    }

    async fn get_member(
        &self,
        classroom_id: Uuid,
        user_id: i64,
    ) -> Result<Option<ClassroomMember>> {
        self.get_member_impl(classroom_id, user_id).await
    }

    async fn list_members(
        &self,
        classroom_id: Uuid,
        role: Option<Role>,
        page: u64,
        size: u64,
    ) -> Result<PaginatedResponse<ClassroomMember>> {
        self.list_members_impl(classroom_id, role, page, size).await
    }

    async fn list_all_members(&self, classroom_id: Uuid) -> Result<Vec<ClassroomMember>> {
        self.list_all_members_impl(classroom_id).await
    }

    async fn add_member(
        &self,
        classroom_id: Uuid,
        user_id: i64,
        role: Role,
    ) -> Result<UserClassroom> {
        self.add_member_impl(classroom_id, user_id, role).await
    }

    async fn update_member_role(
        &self,
        classroom_id: Uuid,
        user_id: i64,
        role: Role,
    ) -> Result<Option<UserClassroom>> {
        self.update_member_role_impl(classroom_id, user_id, role)
            .await
    }

    async fn update_member_team(
        &self,
        classroom_id: Uuid,
        user_id: i64,
        team_id: Option<Uuid>,
    ) -> Result<Option<UserClassroom>> {
        self.update_member_team_impl(classroom_id, user_id, team_id)
            .await
    }

    async fn remove_member(&self, classroom_id: Uuid, user_id: i64) -> Result<bool> {
        self.remove_member_impl(classroom_id, user_id).await
    }

    // 团队模块
    async fn create_team(
        &self,
        classroom_id: Uuid,
        name: &str,
        group_id: i64,
        gitlab_web_url: &str,
    ) -> Result<Team> {
        self.create_team_impl(classroom_id, name, group_id, gitlab_web_url)
            .await
    }

    async fn get_team(&self, classroom_id: Uuid, team_id: Uuid) -> Result<Option<Team>> {
        self.get_team_impl(classroom_id, team_id).await
    }

    async fn list_teams(&self, classroom_id: Uuid) -> Result<Vec<TeamWithMembers>> {
        self.list_teams_impl(classroom_id).await
    }

    async fn count_teams(&self, classroom_id: Uuid) -> Result<u64> {
        self.count_teams_impl(classroom_id).await
    }

    async fn count_team_members(&self, team_id: Uuid) -> Result<u64> {
        self.count_team_members_impl(team_id).await
    }

    async fn list_team_members(&self, team_id: Uuid) -> Result<Vec<ClassroomMember>> {
        self.list_team_members_impl(team_id).await
    }

    async fn rename_team(&self, team_id: Uuid, name: &str) -> Result<Option<Team>> {
        self.rename_team_impl(team_id, name).await
    }

    async fn delete_team(&self, team_id: Uuid) -> Result<bool> {
        self.delete_team_impl(team_id).await
    }

    // 作业模块
    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment> {
        self.create_assignment_impl(assignment).await
    }

    async fn get_assignment(
        &self,
        classroom_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Option<Assignment>> {
        self.get_assignment_impl(classroom_id, assignment_id).await
    }

    async fn list_assignments(&self, classroom_id: Uuid) -> Result<Vec<Assignment>> {
        self.list_assignments_impl(classroom_id).await
    }

    async fn update_assignment(
        &self,
        assignment_id: Uuid,
        update: &UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        self.update_assignment_impl(assignment_id, update).await
    }

    async fn set_assignment_closed(&self, assignment_id: Uuid, closed: bool) -> Result<bool> {
        self.set_assignment_closed_impl(assignment_id, closed).await
    }

    async fn list_due_open_assignments(&self, now: DateTime<Utc>) -> Result<Vec<Assignment>> {
        self.list_due_open_assignments_impl(now).await
    }

    async fn set_assignment_rubrics(
        &self,
        assignment_id: Uuid,
        rubric_ids: &[Uuid],
    ) -> Result<()> {
        self.set_assignment_rubrics_impl(assignment_id, rubric_ids)
            .await
    }

    async fn list_assignment_rubrics(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<ManualGradingRubric>> {
        self.list_assignment_rubrics_impl(assignment_id).await
    }

    // 作业项目模块
    async fn create_assignment_projects(
        &self,
        assignment_id: Uuid,
        team_ids: &[Uuid],
    ) -> Result<Vec<AssignmentProject>> {
        self.create_assignment_projects_impl(assignment_id, team_ids)
            .await
    }

    async fn get_assignment_project(
        &self,
        classroom_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<AssignmentProject>> {
        self.get_assignment_project_impl(classroom_id, project_id)
            .await
    }

    async fn get_assignment_project_by_team(
        &self,
        assignment_id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<AssignmentProject>> {
        self.get_assignment_project_by_team_impl(assignment_id, team_id)
            .await
    }

    async fn list_assignment_projects(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<AssignmentProject>> {
        self.list_assignment_projects_impl(assignment_id).await
    }

    async fn list_accepted_projects_by_classroom(
        &self,
        classroom_id: Uuid,
    ) -> Result<Vec<AssignmentProject>> {
        self.list_accepted_projects_by_classroom_impl(classroom_id)
            .await
    }

    async fn list_accepted_projects_by_team(
        &self,
        team_id: Uuid,
        open_only: bool,
    ) -> Result<Vec<AssignmentProject>> {
        self.list_accepted_projects_by_team_impl(team_id, open_only)
            .await
    }

    async fn claim_pending_project(&self, project_id: Uuid) -> Result<bool> {
        self.claim_pending_project_impl(project_id).await
    }

    async fn update_project_status(
        &self,
        project_id: Uuid,
        status: ProjectStatus,
        gitlab_project_id: Option<i64>,
        gitlab_web_url: Option<String>,
    ) -> Result<Option<AssignmentProject>> {
        self.update_project_status_impl(project_id, status, gitlab_project_id, gitlab_web_url)
            .await
    }

    async fn update_junit_result(
        &self,
        project_id: Uuid,
        summary: &TestReportSummary,
    ) -> Result<bool> {
        self.update_junit_result_impl(project_id, summary).await
    }

    async fn assignment_has_accepted_projects(&self, assignment_id: Uuid) -> Result<bool> {
        self.assignment_has_accepted_projects_impl(assignment_id)
            .await
    }

    async fn team_has_accepted_projects(&self, team_id: Uuid) -> Result<bool> {
        self.team_has_accepted_projects_impl(team_id).await
    }

    // 邀请模块
    async fn create_invitations(
        &self,
        classroom_id: Uuid,
        emails: &[String],
        expiry_date: DateTime<Utc>,
    ) -> Result<Vec<ClassroomInvitation>> {
        self.create_invitations_impl(classroom_id, emails, expiry_date)
            .await
    }

    async fn get_invitation(&self, invitation_id: Uuid) -> Result<Option<ClassroomInvitation>> {
        self.get_invitation_impl(invitation_id).await
    }

    async fn list_invitations(&self, classroom_id: Uuid) -> Result<Vec<ClassroomInvitation>> {
        self.list_invitations_impl(classroom_id).await
    }

    async fn update_invitation_status(
        &self,
        invitation_id: Uuid,
        status: InvitationStatus,
    ) -> Result<Option<ClassroomInvitation>> {
        self.update_invitation_status_impl(invitation_id, status)
            .await
    }

    async fn accept_invitation(&self, invitation_id: Uuid, user_id: i64) -> Result<UserClassroom> {
        self.accept_invitation_impl(invitation_id, user_id).await
    }

    // 评分模块
    async fn create_rubric(
        &self,
        classroom_id: Uuid,
        rubric: &RubricRequest,
    ) -> Result<ManualGradingRubric> {
        self.create_rubric_impl(classroom_id, rubric).await
    }

    async fn get_rubric(
        &self,
        classroom_id: Uuid,
        rubric_id: Uuid,
    ) -> Result<Option<ManualGradingRubric>> {
        self.get_rubric_impl(classroom_id, rubric_id).await
    }

    async fn list_rubrics(&self, classroom_id: Uuid) -> Result<Vec<ManualGradingRubric>> {
        self.list_rubrics_impl(classroom_id).await
    }

    async fn update_rubric(
        &self,
        rubric_id: Uuid,
        rubric: &RubricRequest,
    ) -> Result<Option<ManualGradingRubric>> {
        self.update_rubric_impl(rubric_id, rubric).await
    }

    async fn delete_rubric(&self, rubric_id: Uuid) -> Result<bool> {
        self.delete_rubric_impl(rubric_id).await
    }

    async fn upsert_grading_results(
        &self,
        assignment_project_id: Uuid,
        results: &[GradingResultInput],
    ) -> Result<Vec<ManualGradingResult>> {
        self.upsert_grading_results_impl(assignment_project_id, results)
            .await
    }

    async fn list_grading_results(
        &self,
        assignment_project_id: Uuid,
    ) -> Result<Vec<ManualGradingResult>> {
        self.list_grading_results_impl(assignment_project_id).await
    }

    async fn list_assignment_grading_results(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<ManualGradingResult>> {
        self.list_assignment_grading_results_impl(assignment_id)
            .await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SeaOrmStorage;
    use crate::models::users::requests::UpsertUserRequest;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    pub(crate) use super::assignments::tests::new_assignment;
    pub(crate) use super::classrooms::tests::new_classroom;

    /// 已迁移的内存 SQLite 存储
    pub(crate) async fn memory_storage() -> SeaOrmStorage {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.expect("connect sqlite");
        Migrator::up(&db, None).await.expect("migrate");
        SeaOrmStorage::from_connection(db)
    }

    pub(crate) fn gitlab_user(id: i64, username: &str) -> UpsertUserRequest {
        UpsertUserRequest {
            id,
            username: username.to_string(),
            email: format!("{username}@example.org"),
            name: username.to_string(),
            avatar_url: None,
            web_url: Some(format!("https://gitlab.test/{username}")),
        }
    }
}
