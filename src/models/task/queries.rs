use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;

use crate::db::Store;
use crate::errors::AppError;
use crate::models::activity::{self, ActivityEvent, NewActivity};
use crate::models::board;
use crate::models::stage::{Impact, Priority, Stage};
use super::types::{NewTask, Task, TaskUpdate};

const SELECT_TASK: &str = "\
    SELECT o.id, o.op_number, o.title, o.summary, o.status, o.priority, o.owner_id, \
           m.display_name AS owner_name, o.created_by, o.tags, o.materials, o.sector, \
           o.photo_url, o.progress, o.impact, o.due_date, o.created_at, o.updated_at \
    FROM orders o \
    LEFT JOIN members m ON m.id = o.owner_id";

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    op_number: String,
    title: String,
    summary: String,
    status: String,
    priority: i16,
    owner_id: Option<i64>,
    owner_name: Option<String>,
    created_by: String,
    tags: Vec<String>,
    materials: Vec<String>,
    sector: String,
    photo_url: Option<String>,
    progress: i32,
    impact: String,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    /// The store is trusted for shape; unknown codes degrade to defaults.
    fn from(r: TaskRow) -> Self {
        let status = Stage::from_id(&r.status).unwrap_or_else(|| {
            log::warn!("Order {} has unknown status '{}'", r.id, r.status);
            Stage::Pendiente
        });
        Task {
            id: r.id,
            op_number: r.op_number,
            title: r.title,
            summary: r.summary,
            status,
            priority: Priority::from_level(r.priority).unwrap_or(Priority::Media),
            owner_id: r.owner_id,
            owner_name: r.owner_name,
            created_by: r.created_by,
            tags: r.tags,
            materials: r.materials,
            sector: r.sector,
            photo_url: r.photo_url,
            progress: r.progress,
            impact: Impact::from_id(&r.impact).unwrap_or(Impact::Medio),
            due_date: r.due_date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Every OP on the board, most recently updated first.
pub async fn find_all(store: &Store) -> Result<Vec<Task>, AppError> {
    match store {
        Store::Postgres(pool) => {
            let rows = sqlx::query_as::<_, TaskRow>(&format!(
                "{SELECT_TASK} ORDER BY o.updated_at DESC, o.id DESC"
            ))
            .fetch_all(pool)
            .await?;
            Ok(rows.into_iter().map(Task::from).collect())
        }
        Store::Mock(mock) => {
            let data = mock.read();
            let mut tasks: Vec<Task> = data.tasks.iter().map(|t| data.joined_task(t)).collect();
            tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
            Ok(tasks)
        }
    }
}

pub async fn find_by_id(store: &Store, id: i64) -> Result<Option<Task>, AppError> {
    match store {
        Store::Postgres(pool) => {
            let row = sqlx::query_as::<_, TaskRow>(&format!("{SELECT_TASK} WHERE o.id = $1"))
                .bind(id)
                .fetch_optional(pool)
                .await?;
            Ok(row.map(Task::from))
        }
        Store::Mock(mock) => {
            let data = mock.read();
            Ok(data.tasks.iter().find(|t| t.id == id).map(|t| data.joined_task(t)))
        }
    }
}

async fn lock_pg(conn: &mut PgConnection, id: i64) -> Result<Task, AppError> {
    let row = sqlx::query_as::<_, TaskRow>(&format!("{SELECT_TASK} WHERE o.id = $1 FOR UPDATE OF o"))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Task::from(row))
}

async fn write_pg(conn: &mut PgConnection, task: &Task) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE orders SET op_number = $1, title = $2, summary = $3, status = $4, priority = $5, \
             owner_id = $6, tags = $7, materials = $8, sector = $9, photo_url = $10, progress = $11, \
             impact = $12, due_date = $13, updated_at = $14 \
         WHERE id = $15",
    )
    .bind(&task.op_number)
    .bind(&task.title)
    .bind(&task.summary)
    .bind(task.status.id())
    .bind(task.priority.to_level())
    .bind(task.owner_id)
    .bind(&task.tags)
    .bind(&task.materials)
    .bind(&task.sector)
    .bind(&task.photo_url)
    .bind(task.progress)
    .bind(task.impact.id())
    .bind(task.due_date)
    .bind(task.updated_at)
    .bind(task.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Build the stored shape of a new OP.
fn new_task_record(new: &NewTask, now: DateTime<Utc>) -> Task {
    let status = new.status.unwrap_or(Stage::Pendiente);
    Task {
        id: 0,
        op_number: new.op_number.trim().to_string(),
        title: new.title.trim().to_string(),
        summary: new.summary.trim().to_string(),
        status,
        priority: new.priority.unwrap_or(Priority::Media),
        owner_id: new.owner_id,
        owner_name: None,
        created_by: new.created_by.clone(),
        tags: new.tags.clone(),
        materials: new.materials.clone(),
        sector: status.sector().to_string(),
        photo_url: None,
        progress: if status.is_terminal() { 100 } else { 0 },
        impact: new.impact.unwrap_or(Impact::Medio),
        due_date: new.due_date,
        created_at: now,
        updated_at: now,
    }
}

/// Create an OP and log its entry onto the board.
pub async fn create(store: &Store, new: &NewTask, now: DateTime<Utc>) -> Result<(Task, ActivityEvent), AppError> {
    if new.op_number.trim().is_empty() || new.title.trim().is_empty() {
        return Err(AppError::Validation("OP number and client are required".into()));
    }
    let mut task = new_task_record(new, now);
    match store {
        Store::Postgres(pool) => {
            let mut tx = pool.begin().await?;
            let (id,): (i64,) = sqlx::query_as(
                "INSERT INTO orders (op_number, title, summary, status, priority, owner_id, created_by, \
                     tags, materials, sector, photo_url, progress, impact, due_date, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) RETURNING id",
            )
            .bind(&task.op_number)
            .bind(&task.title)
            .bind(&task.summary)
            .bind(task.status.id())
            .bind(task.priority.to_level())
            .bind(task.owner_id)
            .bind(&task.created_by)
            .bind(&task.tags)
            .bind(&task.materials)
            .bind(&task.sector)
            .bind(&task.photo_url)
            .bind(task.progress)
            .bind(task.impact.id())
            .bind(task.due_date)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&mut *tx)
            .await?;
            task.id = id;
            let activity_id = activity::insert_pg(&mut tx, &board::creation_activity(&task)).await?;
            tx.commit().await?;

            let task = find_by_id(store, id).await?.ok_or(AppError::NotFound)?;
            let event = activity::find_by_id(store, activity_id).await?.ok_or(AppError::NotFound)?;
            Ok((task, event))
        }
        Store::Mock(mock) => {
            let mut data = mock.write();
            task.id = data.next_id();
            data.tasks.push(task.clone());
            let event = activity::insert_mock(&mut data, &board::creation_activity(&task));
            Ok((data.joined_task(&task), event))
        }
    }
}

/// Load, mutate with `apply`, persist, and append the activity it returns.
async fn mutate(
    store: &Store,
    id: i64,
    apply: impl FnOnce(&mut Task) -> Option<NewActivity>,
) -> Result<(Task, Option<ActivityEvent>), AppError> {
    match store {
        Store::Postgres(pool) => {
            let mut tx = pool.begin().await?;
            let mut task = lock_pg(&mut tx, id).await?;
            let before = task.clone();
            let new_activity = apply(&mut task);
            if task != before {
                write_pg(&mut tx, &task).await?;
            }
            let activity_id = match &new_activity {
                Some(a) => Some(activity::insert_pg(&mut tx, a).await?),
                None => None,
            };
            tx.commit().await?;

            let task = find_by_id(store, id).await?.ok_or(AppError::NotFound)?;
            let event = match activity_id {
                Some(aid) => activity::find_by_id(store, aid).await?,
                None => None,
            };
            Ok((task, event))
        }
        Store::Mock(mock) => {
            let mut data = mock.write();
            let idx = data.tasks.iter().position(|t| t.id == id).ok_or(AppError::NotFound)?;
            let mut task = data.tasks[idx].clone();
            let new_activity = apply(&mut task);
            task.owner_name = None;
            data.tasks[idx] = task.clone();
            let event = new_activity.map(|a| activity::insert_mock(&mut data, &a));
            Ok((data.joined_task(&task), event))
        }
    }
}

/// Move an OP to another stage. Moving to its current stage changes nothing
/// and logs nothing.
pub async fn move_to(
    store: &Store,
    id: i64,
    to: Stage,
    now: DateTime<Utc>,
) -> Result<(Task, Option<ActivityEvent>), AppError> {
    mutate(store, id, |task| board::apply_move(task, to, now)).await
}

/// Replace the editable fields of an OP.
pub async fn update(
    store: &Store,
    id: i64,
    update: TaskUpdate,
    now: DateTime<Utc>,
) -> Result<(Task, Option<ActivityEvent>), AppError> {
    if update.op_number.trim().is_empty() || update.title.trim().is_empty() {
        return Err(AppError::Validation("OP number and client are required".into()));
    }
    mutate(store, id, |task| board::apply_edit(task, update, now)).await
}

/// Attach an uploaded photo. Not a status change, so nothing is logged.
pub async fn set_photo(store: &Store, id: i64, url: &str, now: DateTime<Utc>) -> Result<Task, AppError> {
    let url = url.to_string();
    let (task, _) = mutate(store, id, |task| {
        task.photo_url = Some(url);
        task.updated_at = now;
        None
    })
    .await?;
    Ok(task)
}

/// Delete an OP together with its history.
pub async fn delete(store: &Store, id: i64) -> Result<(), AppError> {
    match store {
        Store::Postgres(pool) => {
            let result = sqlx::query("DELETE FROM orders WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound);
            }
            Ok(())
        }
        Store::Mock(mock) => {
            let mut data = mock.write();
            let before = data.tasks.len();
            data.tasks.retain(|t| t.id != id);
            if data.tasks.len() == before {
                return Err(AppError::NotFound);
            }
            data.activity.retain(|a| a.task_id != id);
            for n in data.notifications.iter_mut().filter(|n| n.task_id == Some(id)) {
                n.task_id = None;
            }
            Ok(())
        }
    }
}
