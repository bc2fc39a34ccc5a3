use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::db::{MockData, Store};
use crate::errors::AppError;
use crate::models::stage::Stage;
use super::types::{ActivityEvent, NewActivity};

const SELECT_ACTIVITY: &str = "\
    SELECT a.id, a.order_id, a.from_status, a.to_status, a.actor_id, \
           m.display_name AS actor_name, a.note, a.created_at \
    FROM order_movements a \
    LEFT JOIN members m ON m.id = a.actor_id";

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: i64,
    order_id: i64,
    from_status: Option<String>,
    to_status: String,
    actor_id: Option<i64>,
    actor_name: Option<String>,
    note: String,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityEvent {
    fn from(r: ActivityRow) -> Self {
        let to_status = Stage::from_id(&r.to_status).unwrap_or_else(|| {
            log::warn!("Movement {} has unknown to_status '{}'", r.id, r.to_status);
            Stage::Pendiente
        });
        ActivityEvent {
            id: r.id,
            task_id: r.order_id,
            from_status: r.from_status.as_deref().and_then(Stage::from_id),
            to_status,
            actor_id: r.actor_id,
            actor_name: r.actor_name,
            note: r.note,
            created_at: r.created_at,
        }
    }
}

/// Insert inside an open transaction. Returns the stored row id.
pub(crate) async fn insert_pg(conn: &mut PgConnection, new: &NewActivity) -> Result<i64, AppError> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO order_movements (order_id, from_status, to_status, actor_id, note, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(new.task_id)
    .bind(new.from_status.map(|s| s.id()))
    .bind(new.to_status.id())
    .bind(new.actor_id)
    .bind(&new.note)
    .bind(new.created_at)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub(crate) fn insert_mock(data: &mut MockData, new: &NewActivity) -> ActivityEvent {
    let event = ActivityEvent {
        id: data.next_id(),
        task_id: new.task_id,
        from_status: new.from_status,
        to_status: new.to_status,
        actor_id: new.actor_id,
        actor_name: None,
        note: new.note.clone(),
        created_at: new.created_at,
    };
    data.activity.push(event.clone());
    data.joined_activity(&event)
}

pub async fn find_by_id(store: &Store, id: i64) -> Result<Option<ActivityEvent>, AppError> {
    match store {
        Store::Postgres(pool) => {
            let row = sqlx::query_as::<_, ActivityRow>(&format!("{SELECT_ACTIVITY} WHERE a.id = $1"))
                .bind(id)
                .fetch_optional(pool)
                .await?;
            Ok(row.map(ActivityEvent::from))
        }
        Store::Mock(mock) => {
            let data = mock.read();
            Ok(data.activity.iter().find(|a| a.id == id).map(|a| data.joined_activity(a)))
        }
    }
}

/// Latest activity across all OPs, newest first, capped at `limit`.
pub async fn find_recent(store: &Store, limit: i64) -> Result<Vec<ActivityEvent>, AppError> {
    let limit = limit.clamp(1, 1000);
    match store {
        Store::Postgres(pool) => {
            let rows = sqlx::query_as::<_, ActivityRow>(&format!(
                "{SELECT_ACTIVITY} ORDER BY a.created_at DESC, a.id DESC LIMIT $1"
            ))
            .bind(limit)
            .fetch_all(pool)
            .await?;
            Ok(rows.into_iter().map(ActivityEvent::from).collect())
        }
        Store::Mock(mock) => {
            let data = mock.read();
            let mut events: Vec<ActivityEvent> = data.activity.iter().map(|a| data.joined_activity(a)).collect();
            sort_newest_first(&mut events);
            events.truncate(limit as usize);
            Ok(events)
        }
    }
}

/// History of one OP, newest first.
pub async fn find_for_task(store: &Store, task_id: i64) -> Result<Vec<ActivityEvent>, AppError> {
    match store {
        Store::Postgres(pool) => {
            let rows = sqlx::query_as::<_, ActivityRow>(&format!(
                "{SELECT_ACTIVITY} WHERE a.order_id = $1 ORDER BY a.created_at DESC, a.id DESC"
            ))
            .bind(task_id)
            .fetch_all(pool)
            .await?;
            Ok(rows.into_iter().map(ActivityEvent::from).collect())
        }
        Store::Mock(mock) => {
            let data = mock.read();
            let mut events: Vec<ActivityEvent> = data
                .activity
                .iter()
                .filter(|a| a.task_id == task_id)
                .map(|a| data.joined_activity(a))
                .collect();
            sort_newest_first(&mut events);
            Ok(events)
        }
    }
}

pub async fn count_for_task(store: &Store, task_id: i64) -> Result<i64, AppError> {
    match store {
        Store::Postgres(pool) => {
            let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_movements WHERE order_id = $1")
                .bind(task_id)
                .fetch_one(pool)
                .await?;
            Ok(n)
        }
        Store::Mock(mock) => Ok(mock.read().activity.iter().filter(|a| a.task_id == task_id).count() as i64),
    }
}

fn sort_newest_first(events: &mut [ActivityEvent]) {
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
