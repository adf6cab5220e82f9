use serde::{Deserialize, Serialize};

use crate::gitlab::OAuthToken;

/// 服务端会话，保存在对象缓存中，cookie 里只有会话 ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub csrf_token: String,
    /// 登录流程中发给 GitLab 的 state
    pub oauth_state: Option<String>,
    pub user_id: Option<i64>,
    pub gitlab_token: Option<OAuthToken>,
    pub created_at: i64,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some() && self.gitlab_token.is_some()
    }
}
