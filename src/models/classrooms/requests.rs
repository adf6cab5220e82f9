use serde::Deserialize;
use ts_rs::TS;

use crate::models::common::PaginationQuery;
use crate::models::user_classrooms::entities::Role;

// 课堂列表查询参数（来自HTTP请求）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct ClassroomQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<Role>,
    pub archived: Option<bool>,
}

fn default_max_team_size() -> i32 {
    1
}

// 创建课堂请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct CreateClassroomRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub create_teams: bool,
    #[serde(default = "default_max_team_size")]
    pub max_team_size: i32,
    #[serde(default)]
    pub max_teams: i32,
    #[serde(default)]
    pub students_view_all_projects: bool,
}

impl CreateClassroomRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("request requires a name");
        }
        if self.max_team_size < 1 {
            return Err("max_team_size must be at least 1");
        }
        if self.max_teams < 0 {
            return Err("max_teams must not be negative");
        }
        Ok(())
    }
}

// 更新课堂名称和描述，两者都必须提供
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct UpdateClassroomRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl UpdateClassroomRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.is_empty() || self.description.is_empty() {
            return Err("request requires name and description");
        }
        Ok(())
    }
}

// 新建课堂（存储层使用），GitLab 组和令牌已经创建好
#[derive(Debug, Clone)]
pub struct NewClassroom {
    pub name: String,
    pub description: String,
    pub owner_id: i64,
    pub gitlab_group_id: i64,
    pub gitlab_web_url: String,
    pub group_access_token_id: i64,
    pub group_access_token: String,
    pub create_teams: bool,
    pub max_team_size: i32,
    pub max_teams: i32,
    pub students_view_all_projects: bool,
}

// 用户课堂列表过滤条件（存储层使用）
#[derive(Debug, Clone, Default)]
pub struct ClassroomListFilter {
    pub page: u64,
    pub size: u64,
    pub role: Option<Role>,
    pub archived: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_requires_both_fields() {
        let empty = UpdateClassroomRequest::default();
        assert_eq!(empty.validate(), Err("request requires name and description"));

        let only_name = UpdateClassroomRequest {
            name: "x".into(),
            ..Default::default()
        };
        assert!(only_name.validate().is_err());

        let full = UpdateClassroomRequest {
            name: "x".into(),
            description: "y".into(),
        };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn create_defaults() {
        let req: CreateClassroomRequest =
            serde_json::from_str(r#"{"name": "SE", "description": "d"}"#).expect("valid json");
        assert_eq!(req.max_team_size, 1);
        assert_eq!(req.max_teams, 0);
        assert!(!req.create_teams);
        assert!(req.validate().is_ok());
    }
}
