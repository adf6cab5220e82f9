use serde::Deserialize;
use ts_rs::TS;

// 创建或重命名团队
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
pub struct TeamNameRequest {
    #[serde(default)]
    pub name: String,
}

impl TeamNameRequest {
    pub fn validate(&self) -> Result<&str, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("request requires a team name");
        }
        Ok(name)
    }
}
