use serde::Deserialize;
use ts_rs::TS;

use crate::utils::validate::validate_email;

pub const DEFAULT_EXPIRY_DAYS: i64 = 14;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/invitation.ts")]
pub struct CreateInvitationsRequest {
    #[serde(default)]
    pub emails: Vec<String>,
    pub expiry_days: Option<i64>,
}

impl CreateInvitationsRequest {
    /// 返回去重、规范化后的邮箱列表
    pub fn validate(&self) -> Result<Vec<String>, String> {
        if self.emails.is_empty() {
            return Err("request requires at least one email".to_string());
        }
        if let Some(days) = self.expiry_days
            && !(1..=365).contains(&days)
        {
            return Err("expiry_days must be between 1 and 365".to_string());
        }

        let mut emails: Vec<String> = Vec::with_capacity(self.emails.len());
        for raw in &self.emails {
            let email = raw.trim().to_lowercase();
            validate_email(&email).map_err(|e| format!("{e}: {raw}"))?;
            if !emails.contains(&email) {
                emails.push(email);
            }
        }
        Ok(emails)
    }

    pub fn expiry_days(&self) -> i64 {
        self.expiry_days.unwrap_or(DEFAULT_EXPIRY_DAYS)
    }
}
