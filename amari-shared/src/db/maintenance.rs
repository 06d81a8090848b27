/// Periodic cleanup of expired credentials
///
/// Expired sessions and used or expired reset tokens are already ignored by
/// every lookup; purging only keeps the tables small.

use sqlx::PgPool;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::models::password_reset::PasswordReset;
use crate::models::session::Session;

/// Default interval between purges
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Rows removed by one purge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub sessions: u64,
    pub password_resets: u64,
}

/// Deletes expired sessions and stale reset tokens
pub async fn purge_expired(pool: &PgPool) -> Result<PurgeReport, sqlx::Error> {
    let sessions = Session::purge_expired(pool).await?;
    let password_resets = PasswordReset::purge_stale(pool).await?;

    Ok(PurgeReport {
        sessions,
        password_resets,
    })
}

/// Spawns a background task running [`purge_expired`] every `period`
///
/// Failures are logged and retried on the next tick. Abort the returned
/// handle to stop the task.
pub fn spawn_purge_task(pool: PgPool, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match purge_expired(&pool).await {
                Ok(report) if report != PurgeReport::default() => {
                    tracing::info!(
                        sessions = report.sessions,
                        password_resets = report.password_resets,
                        "Purged expired credentials"
                    );
                }
                Ok(_) => tracing::debug!("No expired credentials to purge"),
                Err(e) => tracing::error!(error = %e, "Failed to purge expired credentials"),
            }
        }
    })
}
