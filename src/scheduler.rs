use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::db::Store;
use crate::errors::AppError;
use crate::models::notification::{self, NewNotification, NotificationKind};
use crate::models::stalled::{self, StallSeverity};
use crate::models::{member, task};
use crate::realtime::{self, ConnectionMap};

const CHECK_INTERVAL: Duration = Duration::from_secs(300);
/// A member hears about the same stalled OP at most once per window.
const REPEAT_WINDOW_HOURS: i64 = 24;

pub fn spawn_scheduler(store: Store, conn_map: ConnectionMap, stall_hours: i64) {
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(CHECK_INTERVAL);
        loop {
            interval.tick().await;
            log::debug!("Running stalled-OP check");
            match check_stalled(&store, &conn_map, Utc::now(), stall_hours).await {
                Ok(0) => {}
                Ok(sent) => log::info!("Stalled-OP check sent {sent} notifications"),
                Err(e) => log::error!("Stalled-OP check failed: {e}"),
            }
        }
    });
}

/// Notify owners (or admins, for unassigned OPs) about stalled tasks.
/// A failed insert is logged and the sweep goes on. Returns how many
/// notifications were sent.
pub async fn check_stalled(
    store: &Store,
    conn_map: &ConnectionMap,
    now: DateTime<Utc>,
    stall_hours: i64,
) -> Result<usize, AppError> {
    let tasks = task::find_all(store).await?;
    let stalled = stalled::detect(&tasks, now, stall_hours);
    if stalled.is_empty() {
        return Ok(0);
    }

    let admins = member::find_admin_ids(store).await?;
    let since = now - chrono::Duration::hours(REPEAT_WINDOW_HOURS);
    let mut sent = 0;

    for item in &stalled {
        let recipients = match item.task.owner_id {
            Some(owner) => vec![owner],
            None => admins.clone(),
        };
        let message = match item.severity {
            StallSeverity::Critical => format!(
                "OP {} lleva {} sin moverse en {} (crítico)",
                item.task.op_number,
                item.idle_label(),
                item.task.status.label()
            ),
            StallSeverity::Warning => format!(
                "OP {} lleva {} sin moverse en {}",
                item.task.op_number,
                item.idle_label(),
                item.task.status.label()
            ),
        };

        for recipient in recipients {
            if notification::exists_since(store, recipient, NotificationKind::Stalled, item.task.id, since).await? {
                continue;
            }
            let new = NewNotification {
                recipient_id: recipient,
                kind: NotificationKind::Stalled,
                message: message.clone(),
                task_id: Some(item.task.id),
            };
            match realtime::notify(conn_map, store, &new, now).await {
                Ok(_) => sent += 1,
                Err(e) => log::error!("Failed to notify member {recipient} about OP {}: {e}", item.task.op_number),
            }
        }
    }
    Ok(sent)
}
