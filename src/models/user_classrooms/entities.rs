use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::models::users::entities::User;

// 课堂内角色
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/classroom-member.ts")]
pub enum Role {
    Owner,     // 创建者
    Moderator, // 助教
    Student,   // 学生
}

impl Role {
    pub const OWNER: &'static str = "owner";
    pub const MODERATOR: &'static str = "moderator";
    pub const STUDENT: &'static str = "student";
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "invalid classroom role: '{s}'. supported roles: owner, moderator, student"
            ))
        })
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Owner => write!(f, "{}", Role::OWNER),
            Role::Moderator => write!(f, "{}", Role::MODERATOR),
            Role::Student => write!(f, "{}", Role::STUDENT),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Role::OWNER => Ok(Role::Owner),
            Role::MODERATOR => Ok(Role::Moderator),
            Role::STUDENT => Ok(Role::Student),
            _ => Err(format!("Invalid classroom role: {s}")),
        }
    }
}

/// 课堂成员关系，(user_id, classroom_id) 唯一
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom-member.ts")]
pub struct UserClassroom {
    pub user_id: i64,
    pub classroom_id: Uuid,
    pub role: Role,
    pub team_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 带用户资料的成员
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom-member.ts")]
pub struct ClassroomMember {
    pub user: User,
    pub role: Role,
    pub team_id: Option<Uuid>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}
