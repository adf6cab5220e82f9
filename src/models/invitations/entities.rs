use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::models::ErrorCode;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/invitation.ts")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
    Revoked,
}

impl<'de> Deserialize<'de> for InvitationStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvitationStatus::Pending => write!(f, "pending"),
            InvitationStatus::Accepted => write!(f, "accepted"),
            InvitationStatus::Rejected => write!(f, "rejected"),
            InvitationStatus::Revoked => write!(f, "revoked"),
        }
    }
}

impl std::str::FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "rejected" => Ok(InvitationStatus::Rejected),
            "revoked" => Ok(InvitationStatus::Revoked),
            _ => Err(format!("Invalid invitation status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/invitation.ts")]
pub struct ClassroomInvitation {
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub email: String,
    pub status: InvitationStatus,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClassroomInvitation {
    /// 接受或拒绝邀请的前置条件：状态为 pending 且未过期
    pub fn check_answerable(&self, now: DateTime<Utc>) -> Result<(), (ErrorCode, &'static str)> {
        if self.status != InvitationStatus::Pending {
            return Err((
                ErrorCode::InvitationNotPending,
                "invitation is no longer pending",
            ));
        }
        if self.expiry_date <= now {
            return Err((ErrorCode::InvitationExpired, "invitation has expired"));
        }
        Ok(())
    }

    pub fn is_for(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invitation(status: InvitationStatus, expiry_date: DateTime<Utc>) -> ClassroomInvitation {
        ClassroomInvitation {
            id: Uuid::new_v4(),
            classroom_id: Uuid::new_v4(),
            email: "Student@Example.org".to_string(),
            status,
            expiry_date,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn pending_and_unexpired_is_answerable() {
        let now = Utc::now();
        assert!(
            invitation(InvitationStatus::Pending, now + Duration::days(1))
                .check_answerable(now)
                .is_ok()
        );
    }

    #[test]
    fn expired_or_answered_is_rejected() {
        let now = Utc::now();
        let expired = invitation(InvitationStatus::Pending, now - Duration::seconds(1));
        assert_eq!(
            expired.check_answerable(now).map_err(|e| e.0),
            Err(ErrorCode::InvitationExpired)
        );

        let revoked = invitation(InvitationStatus::Revoked, now + Duration::days(1));
        assert_eq!(
            revoked.check_answerable(now).map_err(|e| e.0),
            Err(ErrorCode::InvitationNotPending)
        );
    }

    #[test]
    fn email_match_ignores_case() {
        let inv = invitation(InvitationStatus::Pending, Utc::now());
        assert!(inv.is_for("student@example.org "));
        assert!(!inv.is_for("other@example.org"));
    }
}
