use serde::Deserialize;

// GitLab OAuth 回调参数
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// 用户拒绝授权时 GitLab 返回 error
    pub error: Option<String>,
}
