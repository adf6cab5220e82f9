//! GitLab OAuth2 授权码流程

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::warn;

use super::{GitLabError, GitLabResult};
use crate::config::AppConfig;

/// 令牌在到期前这么多秒内就视为过期
const EXPIRY_SKEW_SECS: i64 = 60;

/// GitLab 返回的 OAuth 令牌，保存在服务端会话中
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub created_at: i64,
}

impl OAuthToken {
    pub fn expires_at(&self) -> i64 {
        self.created_at + self.expires_in
    }

    /// `expires_in` 为 0 表示不过期
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_in > 0 && now + EXPIRY_SKEW_SECS >= self.expires_at()
    }

    pub fn secret(&self) -> SecretString {
        SecretString::from(self.access_token.clone())
    }
}

pub struct GitLabOAuth {
    http: reqwest::Client,
    gitlab_url: String,
    client_id: String,
    client_secret: SecretString,
    redirect_url: String,
}

impl GitLabOAuth {
    pub fn new(
        gitlab_url: &str,
        client_id: &str,
        client_secret: SecretString,
        redirect_url: &str,
        timeout: Duration,
    ) -> GitLabResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| GitLabError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            gitlab_url: gitlab_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret,
            redirect_url: redirect_url.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> GitLabResult<Self> {
        Self::new(
            &config.gitlab.url,
            &config.gitlab.client_id,
            SecretString::from(config.gitlab.client_secret.clone()),
            &config.gitlab.redirect_url,
            Duration::from_secs(config.gitlab.request_timeout),
        )
    }

    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/oauth/authorize?client_id={}&redirect_uri={}&response_type=code&state={}&scope=api",
            self.gitlab_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_url),
            urlencoding::encode(state),
        )
    }

    pub async fn exchange_code(&self, code: &str) -> GitLabResult<OAuthToken> {
        self.request_token(json!({
            "client_id": self.client_id,
            "client_secret": self.client_secret.expose_secret(),
            "code": code,
            "grant_type": "authorization_code",
            "redirect_uri": self.redirect_url,
        }))
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> GitLabResult<OAuthToken> {
        self.request_token(json!({
            "client_id": self.client_id,
            "client_secret": self.client_secret.expose_secret(),
            "refresh_token": refresh_token,
            "grant_type": "refresh_token",
            "redirect_uri": self.redirect_url,
        }))
        .await
    }

    async fn request_token(&self, body: serde_json::Value) -> GitLabResult<OAuthToken> {
        let resp = self
            .http
            .post(format!("{}/oauth/token", self.gitlab_url))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!("OAuth token endpoint returned {}: {}", status, text);
            return Err(GitLabError::api(status.as_u16(), text));
        }

        let mut token: OAuthToken = resp
            .json()
            .await
            .map_err(|e| GitLabError::Decode(e.to_string()))?;
        if token.created_at == 0 {
            token.created_at = chrono::Utc::now().timestamp();
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth() -> GitLabOAuth {
        GitLabOAuth::new(
            "https://gitlab.example.org/",
            "client id",
            SecretString::from("secret".to_string()),
            "http://localhost:8080/api/v1/auth/callback",
            Duration::from_secs(5),
        )
        .expect("client builds")
    }

    #[test]
    fn authorize_url_encodes_parameters() {
        let url = oauth().authorize_url("a b");
        assert!(url.starts_with("https://gitlab.example.org/oauth/authorize?"));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fapi%2Fv1%2Fauth%2Fcallback"
        ));
        assert!(url.contains("state=a%20b"));
    }

    #[test]
    fn token_expiry_has_skew() {
        let token = OAuthToken {
            access_token: "t".into(),
            refresh_token: "r".into(),
            expires_in: 7200,
            created_at: 1_000,
        };
        assert!(!token.is_expired(1_000));
        assert!(token.is_expired(1_000 + 7200 - 30));

        let eternal = OAuthToken {
            expires_in: 0,
            ..token
        };
        assert!(!eternal.is_expired(i64::MAX - EXPIRY_SKEW_SECS));
    }
}
