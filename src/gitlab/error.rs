use thiserror::Error;

/// GitLab 调用错误，HTTP 错误携带状态码供调用方分支处理
#[derive(Debug, Clone, Error)]
pub enum GitLabError {
    #[error("GitLab API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("GitLab request failed: {0}")]
    Request(String),
    #[error("GitLab response could not be decoded: {0}")]
    Decode(String),
}

pub type GitLabResult<T> = std::result::Result<T, GitLabError>;

impl GitLabError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        GitLabError::Api {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GitLabError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }
}

impl From<reqwest::Error> for GitLabError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GitLabError::Decode(err.to_string())
        } else {
            GitLabError::Request(err.to_string())
        }
    }
}
