//! 学生项目访问级别的降级与恢复
//!
//! 归档课堂、关闭作业时把已接受项目中学生高于 Reporter 的访问级别降为 Reporter；
//! 作业重新开放时恢复 Developer（当前为 Owner 的跳过）。学生换团队时同步团队项目的直接成员关系。每次修改前读取原级别，
//! 中途失败时按逆序恢复已修改的项目成员，数据库中的标志保持不变。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::Result;
use crate::gitlab::{AccessLevel, GitLabApi, GitLabError};
use crate::models::{
    assignments::{entities::Assignment, requests::UpdateAssignmentRequest},
    classrooms::entities::Classroom,
    projects::entities::AssignmentProject,
    user_classrooms::entities::Role,
};
use crate::storage::Storage;
use crate::utils::Compensator;

/// 一个 (GitLab 项目, 学生) 组合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentTarget {
    pub project_id: i64,
    pub user_id: i64,
}

/// 已接受项目所属团队中的学生
pub async fn student_targets(
    storage: &dyn Storage,
    projects: &[AssignmentProject],
) -> Result<Vec<StudentTarget>> {
    let mut students_by_team: HashMap<Uuid, Vec<i64>> = HashMap::new();
    let mut targets = Vec::new();

    for project in projects.iter().filter(|p| p.project_status.is_accepted()) {
        let Some(project_id) = project.gitlab_project_id else {
            continue;
        };
        if !students_by_team.contains_key(&project.team_id) {
            let students = storage
                .list_team_members(project.team_id)
                .await?
                .into_iter()
                .filter(|m| m.role == Role::Student)
                .map(|m| m.user.id)
                .collect();
            students_by_team.insert(project.team_id, students);
        }
        for user_id in &students_by_team[&project.team_id] {
            targets.push(StudentTarget {
                project_id,
                user_id: *user_id,
            });
        }
    }
    Ok(targets)
}

/// 读取原级别，`should_change` 为真时修改并登记恢复原级别的补偿
async fn set_level(
    gitlab: &Arc<dyn GitLabApi>,
    target: StudentTarget,
    level: AccessLevel,
    should_change: fn(AccessLevel) -> bool,
    saga: &mut Compensator<GitLabError>,
) -> std::result::Result<(), GitLabError> {
    let original = gitlab
        .get_access_level_of_user_in_project(target.project_id, target.user_id)
        .await?;
    if !should_change(original) {
        return Ok(());
    }

    let undo = gitlab.clone();
    saga.execute(
        format!(
            "set {} of user {} in project {}",
            level, target.user_id, target.project_id
        ),
        gitlab.change_user_access_level_in_project(target.project_id, target.user_id, level),
        move || async move {
            undo.change_user_access_level_in_project(target.project_id, target.user_id, original)
                .await
        },
    )
    .await
}

/// 只降低高于 Reporter 的成员；Guest 或不是项目成员的学生保持原样
pub async fn demote_to_reporter(
    gitlab: &Arc<dyn GitLabApi>,
    targets: &[StudentTarget],
    saga: &mut Compensator<GitLabError>,
) -> std::result::Result<(), GitLabError> {
    for target in targets {
        set_level(
            gitlab,
            *target,
            AccessLevel::Reporter,
            |current| current > AccessLevel::Reporter,
            saga,
        )
        .await?;
    }
    Ok(())
}

/// 恢复 Developer，当前级别为 Owner 的成员不动
pub async fn restore_developer(
    gitlab: &Arc<dyn GitLabApi>,
    targets: &[StudentTarget],
    saga: &mut Compensator<GitLabError>,
) -> std::result::Result<(), GitLabError> {
    for target in targets {
        set_level(
            gitlab,
            *target,
            AccessLevel::Developer,
            |current| current != AccessLevel::Developer && current != AccessLevel::Owner,
            saga,
        )
        .await?;
    }
    Ok(())
}

/// 学生加入团队：获得团队已 fork 项目的 Developer 权限，已有更高级别的不动
pub async fn grant_team_projects(
    gitlab: &Arc<dyn GitLabApi>,
    projects: &[AssignmentProject],
    user_id: i64,
    saga: &mut Compensator<GitLabError>,
) -> std::result::Result<(), GitLabError> {
    for project_id in projects.iter().filter_map(|p| p.gitlab_project_id) {
        set_level(
            gitlab,
            StudentTarget {
                project_id,
                user_id,
            },
            AccessLevel::Developer,
            |current| current < AccessLevel::Developer,
            saga,
        )
        .await?;
    }
    Ok(())
}

/// 离开团队：移除用户在团队项目中的直接成员关系，本来就不是成员的跳过
pub async fn revoke_team_projects(
    gitlab: &Arc<dyn GitLabApi>,
    projects: &[AssignmentProject],
    user_id: i64,
) -> std::result::Result<(), GitLabError> {
    for project_id in projects.iter().filter_map(|p| p.gitlab_project_id) {
        match gitlab.remove_user_from_project(project_id, user_id).await {
            Err(e) if !e.is_not_found() => return Err(e),
            _ => {}
        }
    }
    Ok(())
}

/// 归档课堂：全部降级成功后才写入 archived 标志
pub async fn archive_classroom(
    storage: &dyn Storage,
    gitlab: &Arc<dyn GitLabApi>,
    classroom: &Classroom,
) -> Result<()> {
    let projects = storage
        .list_accepted_projects_by_classroom(classroom.id)
        .await?;
    let targets = student_targets(storage, &projects).await?;

    let mut saga = Compensator::new(format!("archive classroom {}", classroom.id));
    if let Err(e) = demote_to_reporter(gitlab, &targets, &mut saga).await {
        saga.rollback().await;
        return Err(e.into());
    }
    if let Err(e) = storage.set_classroom_archived(classroom.id, true).await {
        saga.rollback().await;
        return Err(e);
    }
    saga.commit();

    info!(
        "Classroom {} archived, {} student memberships demoted",
        classroom.id,
        targets.len()
    );
    Ok(())
}

/// 关闭作业（截止时间已过）
pub async fn close_assignment(
    storage: &dyn Storage,
    gitlab: &Arc<dyn GitLabApi>,
    assignment: &Assignment,
) -> Result<()> {
    let projects = storage.list_assignment_projects(assignment.id).await?;
    let targets = student_targets(storage, &projects).await?;

    let mut saga = Compensator::new(format!("close assignment {}", assignment.id));
    if let Err(e) = demote_to_reporter(gitlab, &targets, &mut saga).await {
        saga.rollback().await;
        return Err(e.into());
    }
    if let Err(e) = storage.set_assignment_closed(assignment.id, true).await {
        saga.rollback().await;
        return Err(e);
    }
    saga.commit();

    info!("Assignment {} closed", assignment.id);
    Ok(())
}

/// 截止时间移到未来时重新开放作业，同时保存其它修改
pub async fn reopen_assignment(
    storage: &dyn Storage,
    gitlab: &Arc<dyn GitLabApi>,
    assignment: &Assignment,
    update: &UpdateAssignmentRequest,
) -> Result<Option<Assignment>> {
    let projects = storage.list_assignment_projects(assignment.id).await?;
    let targets = student_targets(storage, &projects).await?;

    let mut saga = Compensator::new(format!("reopen assignment {}", assignment.id));
    if let Err(e) = restore_developer(gitlab, &targets, &mut saga).await {
        warn!("Reopening assignment {} failed: {}", assignment.id, e);
        saga.rollback().await;
        return Err(e.into());
    }

    let persisted = async {
        let updated = storage.update_assignment(assignment.id, update).await?;
        storage.set_assignment_closed(assignment.id, false).await?;
        Ok::<_, crate::errors::GitClassroomsError>(updated.map(|a| Assignment {
            closed: false,
            ..a
        }))
    }
    .await;

    match persisted {
        Ok(updated) => {
            saga.commit();
            info!("Assignment {} reopened", assignment.id);
            Ok(updated)
        }
        Err(e) => {
            saga.rollback().await;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::testing::FakeGitLab;
    use crate::models::projects::entities::ProjectStatus;
    use crate::services::test_support::Fixture;

    #[tokio::test]
    async fn targets_cover_students_of_accepted_projects_only() {
        let fx = Fixture::new().await;
        let team = fx.team("red", &[11, 12]).await;
        let other = fx.team("blue", &[13]).await;
        fx.promote(12, Role::Moderator).await;
        let assignment = fx.assignment(None).await;
        fx.accepted_project(&assignment, &team, 900).await;
        fx.pending_project(&assignment, &other).await;

        let projects = fx.storage.list_assignment_projects(assignment.id).await.unwrap();
        let targets = student_targets(fx.storage.as_ref(), &projects).await.unwrap();

        assert_eq!(
            targets,
            vec![StudentTarget {
                project_id: 900,
                user_id: 11
            }]
        );
    }

    #[tokio::test]
    async fn restore_skips_owners_and_rolls_back_on_failure() {
        let fake = FakeGitLab::new();
        let gitlab: Arc<dyn GitLabApi> = fake.clone();
        fake.set_access_level(1, 11, AccessLevel::Reporter);
        fake.set_access_level(1, 12, AccessLevel::Owner);
        fake.set_access_level(1, 13, AccessLevel::Reporter);
        fake.set_access_level(1, 14, AccessLevel::Reporter);
        // 第一次修改是恢复 11，第二次修改 13 失败
        fake.fail_on("change_user_access_level_in_project", 2);

        let targets: Vec<StudentTarget> = [11, 12, 13, 14]
            .into_iter()
            .map(|user_id| StudentTarget {
                project_id: 1,
                user_id,
            })
            .collect();
        let mut saga = Compensator::new("test");
        assert!(restore_developer(&gitlab, &targets, &mut saga).await.is_err());
        assert_eq!(saga.rollback().await, 0);

        assert_eq!(fake.access_level(1, 11), AccessLevel::Reporter);
        assert_eq!(fake.access_level(1, 12), AccessLevel::Owner);
        assert_eq!(fake.access_level(1, 13), AccessLevel::Reporter);
        assert_eq!(fake.access_level(1, 14), AccessLevel::Reporter);
    }

    #[tokio::test]
    async fn close_assignment_demotes_and_marks_closed() {
        let fx = Fixture::new().await;
        let team = fx.team("red", &[11, 12]).await;
        let assignment = fx.assignment(None).await;
        fx.accepted_project(&assignment, &team, 900).await;
        fx.fake.set_access_level(900, 11, AccessLevel::Developer);
        fx.fake.set_access_level(900, 12, AccessLevel::Developer);

        close_assignment(fx.storage.as_ref(), &fx.gitlab(), &assignment)
            .await
            .unwrap();

        assert_eq!(fx.fake.access_level(900, 11), AccessLevel::Reporter);
        assert_eq!(fx.fake.access_level(900, 12), AccessLevel::Reporter);
        let stored = fx
            .storage
            .get_assignment(fx.classroom.id, assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.closed);
        let project = fx
            .storage
            .get_assignment_project_by_team(assignment.id, team.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(project.project_status, ProjectStatus::Accepted);
    }

    #[tokio::test]
    async fn archive_never_raises_guests_or_non_members() {
        let fx = Fixture::new().await;
        let team = fx.team("red", &[11, 12, 13]).await;
        let assignment = fx.assignment(None).await;
        fx.accepted_project(&assignment, &team, 900).await;
        fx.fake.set_access_level(900, 11, AccessLevel::Guest);
        fx.fake.set_access_level(900, 13, AccessLevel::Maintainer);

        let classroom = fx.reload_classroom().await;
        archive_classroom(fx.storage.as_ref(), &fx.gitlab(), &classroom)
            .await
            .unwrap();

        assert_eq!(fx.fake.access_level(900, 11), AccessLevel::Guest);
        assert_eq!(fx.fake.access_level(900, 12), AccessLevel::NoPermissions);
        assert_eq!(fx.fake.access_level(900, 13), AccessLevel::Reporter);
        assert_eq!(fx.fake.count("change_user_access_level_in_project"), 1);
        assert!(fx.reload_classroom().await.archived);
    }

    #[tokio::test]
    async fn team_project_grants_keep_higher_levels_and_revokes_ignore_strangers() {
        let fx = Fixture::new().await;
        let team = fx.team("red", &[]).await;
        let first = fx.assignment(None).await;
        let second = fx.assignment(None).await;
        fx.accepted_project(&first, &team, 900).await;
        fx.accepted_project(&second, &team, 901).await;
        fx.fake.set_access_level(901, 11, AccessLevel::Maintainer);
        let projects = fx
            .storage
            .list_accepted_projects_by_team(team.id, true)
            .await
            .unwrap();
        let gitlab = fx.gitlab();

        let mut saga = Compensator::new("grant");
        grant_team_projects(&gitlab, &projects, 11, &mut saga)
            .await
            .unwrap();
        saga.commit();
        assert_eq!(fx.fake.access_level(900, 11), AccessLevel::Developer);
        assert_eq!(fx.fake.access_level(901, 11), AccessLevel::Maintainer);

        revoke_team_projects(&gitlab, &projects, 11).await.unwrap();
        assert_eq!(fx.fake.access_level(900, 11), AccessLevel::NoPermissions);
        assert_eq!(fx.fake.access_level(901, 11), AccessLevel::NoPermissions);
        // 不是成员时 404 被忽略
        revoke_team_projects(&gitlab, &projects, 11).await.unwrap();
        assert_eq!(fx.fake.count("remove_user_from_project"), 4);
    }
}
