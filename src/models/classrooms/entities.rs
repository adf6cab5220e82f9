use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

/// 课堂，对应一个 GitLab 组
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/classroom.ts")]
pub struct Classroom {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_id: i64,
    pub gitlab_group_id: i64,
    pub gitlab_web_url: String,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub group_access_token_id: i64,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub group_access_token: String,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub group_access_token_created_at: DateTime<Utc>,
    pub archived: bool,
    pub create_teams: bool,
    pub max_team_size: i32,
    /// 0 表示不限制
    pub max_teams: i32,
    pub students_view_all_projects: bool,
    pub potentially_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Classroom {
    /// 组访问令牌是否已超过轮换年龄
    pub fn token_needs_rotation(&self, now: DateTime<Utc>, max_age_hours: i64) -> bool {
        now - self.group_access_token_created_at > Duration::hours(max_age_hours)
    }

    pub fn team_limit_reached(&self, team_count: u64) -> bool {
        self.max_teams > 0 && team_count >= self.max_teams as u64
    }

    pub fn team_is_full(&self, member_count: u64) -> bool {
        member_count >= self.max_team_size.max(1) as u64
    }
}

#[cfg(test)]
pub(crate) fn sample_classroom() -> Classroom {
    let now = Utc::now();
    Classroom {
        id: Uuid::new_v4(),
        name: "Software Engineering".to_string(),
        description: "Winter term".to_string(),
        owner_id: 1,
        gitlab_group_id: 10,
        gitlab_web_url: "https://gitlab.test/groups/se".to_string(),
        group_access_token_id: 20,
        group_access_token: "glpat-test".to_string(),
        group_access_token_created_at: now,
        archived: false,
        create_teams: true,
        max_team_size: 2,
        max_teams: 0,
        students_view_all_projects: false,
        potentially_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_rotation_threshold() {
        let mut classroom = sample_classroom();
        let now = Utc::now();
        classroom.group_access_token_created_at = now - Duration::hours(23);
        assert!(!classroom.token_needs_rotation(now, 24));
        classroom.group_access_token_created_at = now - Duration::hours(25);
        assert!(classroom.token_needs_rotation(now, 24));
    }

    #[test]
    fn zero_max_teams_is_unlimited() {
        let mut classroom = sample_classroom();
        assert!(!classroom.team_limit_reached(1_000));
        classroom.max_teams = 3;
        assert!(!classroom.team_limit_reached(2));
        assert!(classroom.team_limit_reached(3));
    }

    #[test]
    fn token_is_never_serialized() {
        let json = serde_json::to_string(&sample_classroom()).expect("serializable");
        assert!(!json.contains("glpat-test"));
        assert!(!json.contains("group_access_token"));
    }
}
