use chrono::{DateTime, Utc};

use crate::db::Store;
use crate::errors::AppError;
use super::types::{NewNotification, Notification, NotificationKind};

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient_id: i64,
    kind: String,
    message: String,
    order_id: Option<i64>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(r: NotificationRow) -> Self {
        Notification {
            id: r.id,
            recipient_id: r.recipient_id,
            kind: NotificationKind::from_id(&r.kind).unwrap_or(NotificationKind::Mention),
            message: r.message,
            task_id: r.order_id,
            is_read: r.is_read,
            created_at: r.created_at,
        }
    }
}

pub async fn create(store: &Store, new: &NewNotification, now: DateTime<Utc>) -> Result<Notification, AppError> {
    match store {
        Store::Postgres(pool) => {
            let row = sqlx::query_as::<_, NotificationRow>(
                "INSERT INTO notifications (recipient_id, kind, message, order_id, created_at) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, recipient_id, kind, message, order_id, is_read, created_at",
            )
            .bind(new.recipient_id)
            .bind(new.kind.id())
            .bind(&new.message)
            .bind(new.task_id)
            .bind(now)
            .fetch_one(pool)
            .await?;
            Ok(Notification::from(row))
        }
        Store::Mock(mock) => {
            let mut data = mock.write();
            if !data.members.iter().any(|m| m.member.id == new.recipient_id) {
                return Err(AppError::Validation(format!("Unknown recipient {}", new.recipient_id)));
            }
            let n = Notification {
                id: data.next_id(),
                recipient_id: new.recipient_id,
                kind: new.kind,
                message: new.message.clone(),
                task_id: new.task_id,
                is_read: false,
                created_at: now,
            };
            data.notifications.push(n.clone());
            Ok(n)
        }
    }
}

/// Notifications for a member, newest first.
pub async fn find_for_member(store: &Store, member_id: i64, limit: i64) -> Result<Vec<Notification>, AppError> {
    let limit = limit.clamp(1, 500);
    match store {
        Store::Postgres(pool) => {
            let rows = sqlx::query_as::<_, NotificationRow>(
                "SELECT id, recipient_id, kind, message, order_id, is_read, created_at \
                 FROM notifications WHERE recipient_id = $1 \
                 ORDER BY created_at DESC, id DESC LIMIT $2",
            )
            .bind(member_id)
            .bind(limit)
            .fetch_all(pool)
            .await?;
            Ok(rows.into_iter().map(Notification::from).collect())
        }
        Store::Mock(mock) => {
            let data = mock.read();
            let mut list: Vec<Notification> = data
                .notifications
                .iter()
                .filter(|n| n.recipient_id == member_id)
                .cloned()
                .collect();
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            list.truncate(limit as usize);
            Ok(list)
        }
    }
}

/// Unread count; 0 when the store cannot be read, since it only feeds a badge.
pub async fn count_unread(store: &Store, member_id: i64) -> i64 {
    match store {
        Store::Postgres(pool) => {
            let result: Result<(i64,), _> = sqlx::query_as(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read",
            )
            .bind(member_id)
            .fetch_one(pool)
            .await;
            result.map(|r| r.0).unwrap_or(0)
        }
        Store::Mock(mock) => mock
            .read()
            .notifications
            .iter()
            .filter(|n| n.recipient_id == member_id && !n.is_read)
            .count() as i64,
    }
}

/// Mark one notification read. Only the recipient may do so; returns whether
/// a row changed.
pub async fn mark_read(store: &Store, id: i64, member_id: i64) -> Result<bool, AppError> {
    match store {
        Store::Postgres(pool) => {
            let result = sqlx::query(
                "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND recipient_id = $2 AND NOT is_read",
            )
            .bind(id)
            .bind(member_id)
            .execute(pool)
            .await?;
            Ok(result.rows_affected() > 0)
        }
        Store::Mock(mock) => {
            let mut data = mock.write();
            match data
                .notifications
                .iter_mut()
                .find(|n| n.id == id && n.recipient_id == member_id && !n.is_read)
            {
                Some(n) => {
                    n.is_read = true;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }
}

pub async fn mark_all_read(store: &Store, member_id: i64) -> Result<u64, AppError> {
    match store {
        Store::Postgres(pool) => {
            let result = sqlx::query(
                "UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read",
            )
            .bind(member_id)
            .execute(pool)
            .await?;
            Ok(result.rows_affected())
        }
        Store::Mock(mock) => {
            let mut data = mock.write();
            let mut changed = 0;
            for n in data
                .notifications
                .iter_mut()
                .filter(|n| n.recipient_id == member_id && !n.is_read)
            {
                n.is_read = true;
                changed += 1;
            }
            Ok(changed)
        }
    }
}

/// Whether a notification of `kind` about `task_id` was already sent to the
/// member at or after `since`. Used to avoid repeating stall alerts.
pub async fn exists_since(
    store: &Store,
    member_id: i64,
    kind: NotificationKind,
    task_id: i64,
    since: DateTime<Utc>,
) -> Result<bool, AppError> {
    match store {
        Store::Postgres(pool) => {
            let (exists,): (bool,) = sqlx::query_as(
                "SELECT EXISTS (SELECT 1 FROM notifications \
                 WHERE recipient_id = $1 AND kind = $2 AND order_id = $3 AND created_at >= $4)",
            )
            .bind(member_id)
            .bind(kind.id())
            .bind(task_id)
            .bind(since)
            .fetch_one(pool)
            .await?;
            Ok(exists)
        }
        Store::Mock(mock) => Ok(mock.read().notifications.iter().any(|n| {
            n.recipient_id == member_id && n.kind == kind && n.task_id == Some(task_id) && n.created_at >= since
        })),
    }
}
