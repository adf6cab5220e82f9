//! 后台任务
//!
//! 目前只有截止日期检查：定期关闭已过截止时间的作业，并把学生降为 Reporter。

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::Result;
use crate::gitlab::GitLabProvider;
use crate::models::classrooms::entities::Classroom;
use crate::services::access_levels;
use crate::storage::Storage;

/// 关闭所有到期未关闭的作业，返回成功关闭的数量
///
/// 单个作业失败只记录日志，下一轮会重试。
pub async fn close_due_assignments(
    storage: &dyn Storage,
    provider: &dyn GitLabProvider,
    now: DateTime<Utc>,
) -> Result<usize> {
    let due = storage.list_due_open_assignments(now).await?;
    if due.is_empty() {
        return Ok(0);
    }
    debug!("{} assignment(s) past due", due.len());

    let mut classrooms: HashMap<Uuid, Option<Classroom>> = HashMap::new();
    let mut closed = 0;
    for assignment in due {
        let classroom = match classrooms.get(&assignment.classroom_id) {
            Some(cached) => cached.clone(),
            None => {
                let loaded = storage.get_classroom_by_id(assignment.classroom_id).await?;
                classrooms.insert(assignment.classroom_id, loaded.clone());
                loaded
            }
        };
        let Some(classroom) = classroom else {
            warn!(
                "Assignment {} belongs to missing classroom {}",
                assignment.id, assignment.classroom_id
            );
            continue;
        };

        let gitlab = provider.for_classroom(&classroom);
        match access_levels::close_assignment(storage, &gitlab, &assignment).await {
            Ok(()) => closed += 1,
            Err(e) => error!("Failed to close assignment {}: {}", assignment.id, e),
        }
    }

    if closed > 0 {
        info!("Closed {} past-due assignment(s)", closed);
    }
    Ok(closed)
}

/// 启动截止日期检查；间隔为 0 时不启动
pub fn spawn_due_date_sweeper(
    storage: Arc<dyn Storage>,
    provider: Arc<dyn GitLabProvider>,
    interval_secs: u64,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        warn!("Due date check disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) =
                close_due_assignments(storage.as_ref(), provider.as_ref(), Utc::now()).await
            {
                error!("Due date check failed: {}", e);
            }
        }
    }))
}
