use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建用户表（主键为 GitLab 用户 ID）
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::AvatarUrl).string().null())
                    .col(ColumnDef::new(Users::WebUrl).string().null())
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建课堂表
        manager
            .create_table(
                Table::create()
                    .table(Classrooms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Classrooms::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Classrooms::Name).string().not_null())
                    .col(ColumnDef::new(Classrooms::Description).text().not_null())
                    .col(ColumnDef::new(Classrooms::OwnerId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Classrooms::GitlabGroupId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Classrooms::GitlabWebUrl).string().not_null())
                    .col(
                        ColumnDef::new(Classrooms::GroupAccessTokenId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Classrooms::GroupAccessToken)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Classrooms::GroupAccessTokenCreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Classrooms::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Classrooms::CreateTeams)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Classrooms::MaxTeamSize)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Classrooms::MaxTeams)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Classrooms::StudentsViewAllProjects)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Classrooms::PotentiallyDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Classrooms::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Classrooms::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Classrooms::Table, Classrooms::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建团队表
        manager
            .create_table(
                Table::create()
                    .table(Teams::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Teams::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Teams::ClassroomId).uuid().not_null())
                    .col(ColumnDef::new(Teams::Name).string().not_null())
                    .col(ColumnDef::new(Teams::GroupId).big_integer().not_null())
                    .col(ColumnDef::new(Teams::GitlabWebUrl).string().not_null())
                    .col(ColumnDef::new(Teams::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Teams::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Teams::Table, Teams::ClassroomId)
                            .to(Classrooms::Table, Classrooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建课堂成员表，(user_id, classroom_id) 为联合主键
        manager
            .create_table(
                Table::create()
                    .table(UserClassrooms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserClassrooms::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserClassrooms::ClassroomId).uuid().not_null())
                    .col(ColumnDef::new(UserClassrooms::Role).string().not_null())
                    .col(ColumnDef::new(UserClassrooms::TeamId).uuid().null())
                    .col(
                        ColumnDef::new(UserClassrooms::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserClassrooms::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserClassrooms::UserId)
                            .col(UserClassrooms::ClassroomId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserClassrooms::Table, UserClassrooms::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserClassrooms::Table, UserClassrooms::ClassroomId)
                            .to(Classrooms::Table, Classrooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserClassrooms::Table, UserClassrooms::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建作业表
        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Assignments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Assignments::ClassroomId).uuid().not_null())
                    .col(
                        ColumnDef::new(Assignments::TemplateProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assignments::Name).string().not_null())
                    .col(ColumnDef::new(Assignments::Description).text().not_null())
                    .col(ColumnDef::new(Assignments::DueDate).big_integer().null())
                    .col(
                        ColumnDef::new(Assignments::Closed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Assignments::EnableJunitGrading)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Assignments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignments::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Assignments::Table, Assignments::ClassroomId)
                            .to(Classrooms::Table, Classrooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建作业项目表（团队对作业模板的 fork）
        manager
            .create_table(
                Table::create()
                    .table(AssignmentProjects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssignmentProjects::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AssignmentProjects::AssignmentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssignmentProjects::TeamId).uuid().not_null())
                    .col(
                        ColumnDef::new(AssignmentProjects::ProjectStatus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentProjects::GitlabProjectId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentProjects::GitlabWebUrl)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentProjects::JunitTestResult)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentProjects::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentProjects::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AssignmentProjects::Table, AssignmentProjects::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AssignmentProjects::Table, AssignmentProjects::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建课堂邀请表
        manager
            .create_table(
                Table::create()
                    .table(ClassroomInvitations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClassroomInvitations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ClassroomInvitations::ClassroomId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClassroomInvitations::Email).string().not_null())
                    .col(
                        ColumnDef::new(ClassroomInvitations::Status)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassroomInvitations::ExpiryDate)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassroomInvitations::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClassroomInvitations::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ClassroomInvitations::Table, ClassroomInvitations::ClassroomId)
                            .to(Classrooms::Table, Classrooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评分细则表
        manager
            .create_table(
                Table::create()
                    .table(ManualGradingRubrics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ManualGradingRubrics::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ManualGradingRubrics::ClassroomId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ManualGradingRubrics::Name).string().not_null())
                    .col(
                        ColumnDef::new(ManualGradingRubrics::Description)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ManualGradingRubrics::MaxScore)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ManualGradingRubrics::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ManualGradingRubrics::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ManualGradingRubrics::Table, ManualGradingRubrics::ClassroomId)
                            .to(Classrooms::Table, Classrooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建作业与评分细则关联表
        manager
            .create_table(
                Table::create()
                    .table(AssignmentRubrics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssignmentRubrics::AssignmentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssignmentRubrics::RubricId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(AssignmentRubrics::AssignmentId)
                            .col(AssignmentRubrics::RubricId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AssignmentRubrics::Table, AssignmentRubrics::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AssignmentRubrics::Table, AssignmentRubrics::RubricId)
                            .to(ManualGradingRubrics::Table, ManualGradingRubrics::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建人工评分结果表
        manager
            .create_table(
                Table::create()
                    .table(ManualGradingResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ManualGradingResults::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ManualGradingResults::RubricId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ManualGradingResults::AssignmentProjectId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ManualGradingResults::Score)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ManualGradingResults::Feedback).text().null())
                    .col(
                        ColumnDef::new(ManualGradingResults::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ManualGradingResults::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ManualGradingResults::Table, ManualGradingResults::RubricId)
                            .to(ManualGradingRubrics::Table, ManualGradingRubrics::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                ManualGradingResults::Table,
                                ManualGradingResults::AssignmentProjectId,
                            )
                            .to(AssignmentProjects::Table, AssignmentProjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_classrooms_owner_id")
                    .table(Classrooms::Table)
                    .col(Classrooms::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_teams_classroom_id")
                    .table(Teams::Table)
                    .col(Teams::ClassroomId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_classrooms_team_id")
                    .table(UserClassrooms::Table)
                    .col(UserClassrooms::TeamId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignments_classroom_id")
                    .table(Assignments::Table)
                    .col(Assignments::ClassroomId)
                    .to_owned(),
            )
            .await?;

        // 每个团队在同一作业下只有一个项目
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignment_projects_assignment_team")
                    .table(AssignmentProjects::Table)
                    .col(AssignmentProjects::AssignmentId)
                    .col(AssignmentProjects::TeamId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_classroom_invitations_classroom_id")
                    .table(ClassroomInvitations::Table)
                    .col(ClassroomInvitations::ClassroomId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_manual_grading_results_rubric_project")
                    .table(ManualGradingResults::Table)
                    .col(ManualGradingResults::RubricId)
                    .col(ManualGradingResults::AssignmentProjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(ManualGradingResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssignmentRubrics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ManualGradingRubrics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClassroomInvitations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssignmentProjects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserClassrooms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Teams::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classrooms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Username,
    Email,
    Name,
    AvatarUrl,
    WebUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Classrooms {
    #[sea_orm(iden = "classrooms")]
    Table,
    Id,
    Name,
    Description,
    OwnerId,
    GitlabGroupId,
    GitlabWebUrl,
    GroupAccessTokenId,
    GroupAccessToken,
    GroupAccessTokenCreatedAt,
    Archived,
    CreateTeams,
    MaxTeamSize,
    MaxTeams,
    StudentsViewAllProjects,
    PotentiallyDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserClassrooms {
    #[sea_orm(iden = "user_classrooms")]
    Table,
    UserId,
    ClassroomId,
    Role,
    TeamId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Teams {
    #[sea_orm(iden = "teams")]
    Table,
    Id,
    ClassroomId,
    Name,
    GroupId,
    GitlabWebUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assignments {
    #[sea_orm(iden = "assignments")]
    Table,
    Id,
    ClassroomId,
    TemplateProjectId,
    Name,
    Description,
    DueDate,
    Closed,
    EnableJunitGrading,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AssignmentProjects {
    #[sea_orm(iden = "assignment_projects")]
    Table,
    Id,
    AssignmentId,
    TeamId,
    ProjectStatus,
    GitlabProjectId,
    GitlabWebUrl,
    JunitTestResult,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ClassroomInvitations {
    #[sea_orm(iden = "classroom_invitations")]
    Table,
    Id,
    ClassroomId,
    Email,
    Status,
    ExpiryDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ManualGradingRubrics {
    #[sea_orm(iden = "manual_grading_rubrics")]
    Table,
    Id,
    ClassroomId,
    Name,
    Description,
    MaxScore,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AssignmentRubrics {
    #[sea_orm(iden = "assignment_rubrics")]
    Table,
    AssignmentId,
    RubricId,
}

#[derive(DeriveIden)]
enum ManualGradingResults {
    #[sea_orm(iden = "manual_grading_results")]
    Table,
    Id,
    RubricId,
    AssignmentProjectId,
    Score,
    Feedback,
    CreatedAt,
    UpdatedAt,
}
