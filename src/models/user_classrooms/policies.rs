//! 课堂访问策略
//!
//! 每个策略是成员关系和课堂状态上的纯谓词，中间件按链式顺序逐个检查（逻辑与）。

use uuid::Uuid;

use super::entities::{Role, UserClassroom};
use crate::models::ErrorCode;
use crate::models::classrooms::entities::Classroom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassroomPolicy {
    Owner,
    OwnerOrModerator,
    Student,
    /// 可能已被删除的课堂只对创建者可见
    Viewable,
    NotArchived,
    /// 管理者、项目所属团队成员，或课堂允许学生查看所有项目
    ProjectVisible,
}

pub struct PolicyInput<'a> {
    pub classroom: &'a Classroom,
    pub membership: &'a UserClassroom,
    /// 已解析的作业项目所属团队
    pub project_team_id: Option<Uuid>,
}

pub fn is_owner(membership: &UserClassroom) -> bool {
    membership.role == Role::Owner
}

pub fn is_owner_or_moderator(membership: &UserClassroom) -> bool {
    matches!(membership.role, Role::Owner | Role::Moderator)
}

pub fn is_student(membership: &UserClassroom) -> bool {
    membership.role == Role::Student
}

pub fn can_view_classroom(classroom: &Classroom, membership: &UserClassroom) -> bool {
    !classroom.potentially_deleted || is_owner(membership)
}

pub fn can_view_project(
    classroom: &Classroom,
    membership: &UserClassroom,
    project_team_id: Option<Uuid>,
) -> bool {
    if is_owner_or_moderator(membership) || classroom.students_view_all_projects {
        return true;
    }
    matches!((membership.team_id, project_team_id), (Some(own), Some(team)) if own == team)
}

impl ClassroomPolicy {
    pub fn allows(self, input: &PolicyInput<'_>) -> bool {
        match self {
            ClassroomPolicy::Owner => is_owner(input.membership),
            ClassroomPolicy::OwnerOrModerator => is_owner_or_moderator(input.membership),
            ClassroomPolicy::Student => is_student(input.membership),
            ClassroomPolicy::Viewable => can_view_classroom(input.classroom, input.membership),
            ClassroomPolicy::NotArchived => !input.classroom.archived,
            ClassroomPolicy::ProjectVisible => {
                can_view_project(input.classroom, input.membership, input.project_team_id)
            }
        }
    }

    pub fn denial(self) -> (ErrorCode, &'static str) {
        match self {
            ClassroomPolicy::Owner => (
                ErrorCode::ClassroomPermissionDenied,
                "only the classroom owner can do this",
            ),
            ClassroomPolicy::OwnerOrModerator => (
                ErrorCode::ClassroomPermissionDenied,
                "only the classroom owner or moderators can do this",
            ),
            ClassroomPolicy::Student => (
                ErrorCode::ClassroomPermissionDenied,
                "only students can do this",
            ),
            ClassroomPolicy::Viewable => (
                ErrorCode::ClassroomPermissionDenied,
                "classroom is not available",
            ),
            ClassroomPolicy::NotArchived => {
                (ErrorCode::ClassroomArchived, "classroom is archived")
            }
            ClassroomPolicy::ProjectVisible => {
                (ErrorCode::ProjectNotVisible, "project is not visible to you")
            }
        }
    }
}

/// 返回第一个不满足的策略
pub fn first_denied(policies: &[ClassroomPolicy], input: &PolicyInput<'_>) -> Option<ClassroomPolicy> {
    policies.iter().copied().find(|p| !p.allows(input))
}
