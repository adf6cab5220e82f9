//! 课堂组访问令牌轮换
//!
//! 令牌超过轮换年龄后，在下一次所有者访问课堂时轮换。同一课堂的并发轮换
//! 通过 [`SingleFlight`] 合并为一次 GitLab 调用。

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::gitlab::GitLabProvider;
use crate::models::classrooms::entities::Classroom;
use crate::storage::Storage;
use crate::utils::SingleFlight;

pub struct TokenRotator {
    storage: Arc<dyn Storage>,
    provider: Arc<dyn GitLabProvider>,
    flight: SingleFlight<Uuid, Result<Classroom, String>>,
    rotation_age_hours: i64,
    lifetime_days: i64,
}

impl TokenRotator {
    pub fn new(
        storage: Arc<dyn Storage>,
        provider: Arc<dyn GitLabProvider>,
        rotation_age_hours: i64,
        lifetime_days: i64,
    ) -> Self {
        Self {
            storage,
            provider,
            flight: SingleFlight::new(),
            rotation_age_hours,
            lifetime_days,
        }
    }

    pub fn from_config(
        storage: Arc<dyn Storage>,
        provider: Arc<dyn GitLabProvider>,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            storage,
            provider,
            config.gitlab.token_rotation_age_hours,
            config.gitlab.token_lifetime_days,
        )
    }

    pub fn needs_rotation(&self, classroom: &Classroom, now: DateTime<Utc>) -> bool {
        classroom.token_needs_rotation(now, self.rotation_age_hours)
    }

    /// 令牌仍然新鲜时原样返回课堂，否则轮换并返回保存了新令牌的课堂
    pub async fn ensure_fresh(&self, classroom: &Classroom) -> Result<Classroom, String> {
        if !self.needs_rotation(classroom, Utc::now()) {
            return Ok(classroom.clone());
        }

        let storage = self.storage.clone();
        let provider = self.provider.clone();
        let classroom_id = classroom.id;
        let rotation_age_hours = self.rotation_age_hours;
        let lifetime_days = self.lifetime_days;

        self.flight
            .run(classroom_id, move || async move {
                // 读取最新状态，之前的调用可能刚刚轮换过
                let current = storage
                    .get_classroom_by_id(classroom_id)
                    .await
                    .map_err(|e| e.to_string())?
                    .ok_or_else(|| format!("classroom {classroom_id} no longer exists"))?;
                let now = Utc::now();
                if !current.token_needs_rotation(now, rotation_age_hours) {
                    debug!("Token of classroom {} was already rotated", classroom_id);
                    return Ok(current);
                }

                let expires_at = (now + Duration::days(lifetime_days)).date_naive();
                let gitlab = provider.for_classroom(&current);
                let token = gitlab
                    .rotate_group_access_token(
                        current.gitlab_group_id,
                        current.group_access_token_id,
                        expires_at,
                    )
                    .await
                    .map_err(|e| e.to_string())?;

                let updated = storage
                    .update_classroom_token(classroom_id, token.id, &token.token, now)
                    .await
                    .map_err(|e| e.to_string())?
                    .ok_or_else(|| format!("classroom {classroom_id} no longer exists"))?;
                info!(
                    "Rotated group access token of classroom {} (token id {} -> {})",
                    classroom_id, current.group_access_token_id, token.id
                );
                Ok(updated)
            })
            .await
    }

    /// 轮换失败只记录日志，返回原课堂
    pub async fn ensure_fresh_or_keep(&self, classroom: Classroom) -> Classroom {
        match self.ensure_fresh(&classroom).await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(
                    "Failed to rotate group access token of classroom {}: {}",
                    classroom.id, e
                );
                classroom
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::testing::{FakeGitLab, FakeProvider};
    use crate::storage::sea_orm_storage::test_support::{gitlab_user, memory_storage, new_classroom};
    use futures_util::future::join_all;
    use std::time::Duration as StdDuration;

    async fn stale_classroom(storage: &Arc<dyn Storage>) -> Classroom {
        storage.upsert_user(gitlab_user(1, "owner")).await.unwrap();
        let classroom = storage
            .create_classroom(new_classroom(1, "SE"))
            .await
            .unwrap();
        storage
            .update_classroom_token(
                classroom.id,
                classroom.group_access_token_id,
                &classroom.group_access_token,
                Utc::now() - Duration::hours(48),
            )
            .await
            .unwrap()
            .expect("classroom exists")
    }

    #[tokio::test]
    async fn concurrent_rotation_calls_gitlab_once() {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let fake = FakeGitLab::with_rotate_delay(StdDuration::from_millis(50));
        let rotator = TokenRotator::new(
            storage.clone(),
            Arc::new(FakeProvider(fake.clone())),
            24,
            30,
        );
        let classroom = stale_classroom(&storage).await;

        let results = join_all((0..8).map(|_| rotator.ensure_fresh(&classroom))).await;

        assert_eq!(fake.count("rotate_group_access_token"), 1);
        let tokens: Vec<String> = results
            .into_iter()
            .map(|r| r.expect("rotation succeeds").group_access_token)
            .collect();
        assert!(tokens.iter().all(|t| t == &tokens[0]));
        assert_ne!(tokens[0], "glpat-initial");
        assert_eq!(rotator.flight.in_flight(), 0);

        let stored = storage
            .get_classroom_by_id(classroom.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.group_access_token, tokens[0]);
        assert!(!rotator.needs_rotation(&stored, Utc::now()));
    }

    #[tokio::test]
    async fn stale_copy_does_not_rotate_twice() {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let fake = FakeGitLab::new();
        let rotator = TokenRotator::new(storage.clone(), Arc::new(FakeProvider(fake.clone())), 24, 30);
        let classroom = stale_classroom(&storage).await;

        rotator.ensure_fresh(&classroom).await.unwrap();
        // 旧副本仍显示过期，但数据库里的令牌已经是新的
        rotator.ensure_fresh(&classroom).await.unwrap();
        assert_eq!(fake.count("rotate_group_access_token"), 1);
    }

    #[tokio::test]
    async fn fresh_token_is_left_alone_and_failures_keep_the_classroom() {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let fake = FakeGitLab::new();
        let rotator = TokenRotator::new(storage.clone(), Arc::new(FakeProvider(fake.clone())), 24, 30);

        storage.upsert_user(gitlab_user(1, "owner")).await.unwrap();
        let fresh = storage
            .create_classroom(new_classroom(1, "Fresh"))
            .await
            .unwrap();
        rotator.ensure_fresh(&fresh).await.unwrap();
        assert_eq!(fake.count("rotate_group_access_token"), 0);

        let stale = stale_classroom(&storage).await;
        fake.fail_on("rotate_group_access_token", 1);
        let kept = rotator.ensure_fresh_or_keep(stale.clone()).await;
        assert_eq!(kept.group_access_token, stale.group_access_token);
    }
}
