//! The sweep: find what is due and push it out, once per day or on demand.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use certkeep_core::time::until_next_local;

use crate::storage::{Database, DatabaseError};

use super::selector::due_notifications;
use super::sender::MessageSender;

/// Outcome counts of one sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    pub sent: usize,
    pub failed: usize,
}

/// Deliver every reminder due at `now`.
///
/// Delivery failures are counted and logged per recipient; they never stop
/// the rest of the sweep.
pub async fn run_sweep(
    db: &Database,
    sender: &dyn MessageSender,
    now: DateTime<Utc>,
) -> Result<SweepReport, DatabaseError> {
    let due = due_notifications(db, now).await?;
    let mut report = SweepReport::default();

    for notification in due {
        match sender
            .send(notification.owner_id, &notification.message())
            .await
        {
            Ok(()) => report.sent += 1,
            Err(err) => {
                warn!(
                    owner_id = notification.owner_id,
                    organization = %notification.organization,
                    error = %err,
                    "Failed to deliver expiry notice"
                );
                report.failed += 1;
            }
        }
    }

    info!(sent = report.sent, failed = report.failed, "Expiry sweep complete");
    Ok(report)
}

/// Run a sweep every day at `notify_at` local time until shutdown.
pub fn spawn_daily_sweep(
    db: Database,
    sender: Arc<dyn MessageSender>,
    notify_at: NaiveTime,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(notify_at = %notify_at, "Daily notification sweep scheduled");

        loop {
            let wait = until_next_local(notify_at);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if let Err(err) = run_sweep(&db, sender.as_ref(), Utc::now()).await {
                        warn!(error = %err, "Expiry sweep failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("Notification sweep stopped");
                    return;
                }
            }
        }
    })
}
