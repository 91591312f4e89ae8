//! Activity-log retention
//!
//! The activity log is a display-history cap, not an audit requirement;
//! usage history carries the permanent record. A background sweep deletes
//! rows past the configured horizon on a recurring timer.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::error::AppResult;

/// Cleanup service for stale activity-log rows
#[derive(Clone)]
pub struct CleanupService {
    db: PgPool,
}

impl CleanupService {
    /// Create a new CleanupService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Delete activity-log rows older than the horizon, returning how many
    /// were removed
    pub async fn purge_old_activity_logs(&self, older_than: Duration) -> AppResult<u64> {
        let cutoff = Utc::now() - older_than;
        let result = sqlx::query("DELETE FROM activity_log WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Spawn the recurring retention sweep. The first tick fires immediately, so
/// stale rows are cleared at startup as well. Sweep failures are logged and
/// the timer keeps running.
pub fn spawn_retention_sweeper(db: PgPool, horizon: Duration, every: std::time::Duration) {
    tokio::spawn(async move {
        let service = CleanupService::new(db);
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match service.purge_old_activity_logs(horizon).await {
                Ok(0) => {}
                Ok(count) => {
                    tracing::info!("retention sweep removed {} activity log entries", count)
                }
                Err(e) => tracing::warn!("retention sweep failed: {}", e),
            }
        }
    });
}
