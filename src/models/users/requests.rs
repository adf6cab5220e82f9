use crate::gitlab::GitLabUser;

// 登录回调时根据 GitLab 资料创建或更新用户（存储层使用）
#[derive(Debug, Clone)]
pub struct UpsertUserRequest {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub web_url: Option<String>,
}

impl From<&GitLabUser> for UpsertUserRequest {
    fn from(user: &GitLabUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.primary_email(),
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
            web_url: Some(user.web_url.clone()),
        }
    }
}
