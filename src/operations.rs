//! Board mutations shared by the HTML pages and the REST API: persist through
//! the models, then push realtime events and owner notifications.

use chrono::{DateTime, Utc};

use crate::db::Store;
use crate::errors::AppError;
use crate::models::activity::ActivityEvent;
use crate::models::chat::{self, ChatMessage};
use crate::models::member;
use crate::models::notification::{NewNotification, NotificationKind};
use crate::models::stage::Stage;
use crate::models::task::{self, NewTask, Task, TaskUpdate};
use crate::realtime::{self, BoardEvent, ConnectionMap};

/// Who is performing a mutation.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub member_id: i64,
}

/// Notify a member about an OP unless they caused the change themselves.
/// Notification failures are logged, never propagated.
async fn notify_owner(
    conn_map: &ConnectionMap,
    store: &Store,
    actor: Actor,
    owner_id: Option<i64>,
    kind: NotificationKind,
    message: String,
    task_id: i64,
    now: DateTime<Utc>,
) {
    let Some(owner_id) = owner_id.filter(|o| *o != actor.member_id) else {
        return;
    };
    let new = NewNotification { recipient_id: owner_id, kind, message, task_id: Some(task_id) };
    if let Err(e) = realtime::notify(conn_map, store, &new, now).await {
        log::error!("Failed to notify member {owner_id}: {e}");
    }
}

pub async fn create_task(
    store: &Store,
    conn_map: &ConnectionMap,
    actor: Actor,
    new: &NewTask,
    now: DateTime<Utc>,
) -> Result<Task, AppError> {
    let (created, activity) = task::create(store, new, now).await?;
    log::info!("OP {} created (id {})", created.op_number, created.id);
    realtime::broadcast(conn_map, &BoardEvent::TaskCreated { task: &created });
    realtime::broadcast(conn_map, &BoardEvent::ActivityAdded { activity: &activity });
    notify_owner(
        conn_map,
        store,
        actor,
        created.owner_id,
        NotificationKind::Assigned,
        format!("Te asignaron la OP {} ({})", created.op_number, created.title),
        created.id,
        now,
    )
    .await;
    Ok(created)
}

pub async fn move_task(
    store: &Store,
    conn_map: &ConnectionMap,
    actor: Actor,
    id: i64,
    to: Stage,
    now: DateTime<Utc>,
) -> Result<(Task, Option<ActivityEvent>), AppError> {
    let (moved, activity) = task::move_to(store, id, to, now).await?;
    let Some(event) = &activity else {
        return Ok((moved, activity));
    };
    log::info!("OP {} moved to {}", moved.op_number, to);
    realtime::broadcast(conn_map, &BoardEvent::TaskMoved { task: &moved, activity: Some(event) });
    notify_owner(
        conn_map,
        store,
        actor,
        moved.owner_id,
        NotificationKind::Moved,
        event.note.clone(),
        moved.id,
        now,
    )
    .await;
    Ok((moved, activity))
}

pub async fn update_task(
    store: &Store,
    conn_map: &ConnectionMap,
    actor: Actor,
    id: i64,
    update: TaskUpdate,
    now: DateTime<Utc>,
) -> Result<(Task, Option<ActivityEvent>), AppError> {
    let previous_owner = task::find_by_id(store, id).await?.ok_or(AppError::NotFound)?.owner_id;
    let (updated, activity) = task::update(store, id, update, now).await?;

    match &activity {
        Some(event) => realtime::broadcast(
            conn_map,
            &BoardEvent::TaskMoved { task: &updated, activity: Some(event) },
        ),
        None => realtime::broadcast(conn_map, &BoardEvent::TaskUpdated { task: &updated }),
    }

    if updated.owner_id != previous_owner {
        notify_owner(
            conn_map,
            store,
            actor,
            updated.owner_id,
            NotificationKind::Assigned,
            format!("Te asignaron la OP {} ({})", updated.op_number, updated.title),
            updated.id,
            now,
        )
        .await;
    } else if let Some(event) = &activity {
        notify_owner(
            conn_map,
            store,
            actor,
            updated.owner_id,
            NotificationKind::Moved,
            event.note.clone(),
            updated.id,
            now,
        )
        .await;
    }
    Ok((updated, activity))
}

pub async fn delete_task(store: &Store, conn_map: &ConnectionMap, id: i64) -> Result<(), AppError> {
    task::delete(store, id).await?;
    log::info!("OP {id} deleted");
    realtime::broadcast(conn_map, &BoardEvent::TaskDeleted { task_id: id });
    Ok(())
}

pub async fn set_task_photo(
    store: &Store,
    conn_map: &ConnectionMap,
    id: i64,
    url: &str,
    now: DateTime<Utc>,
) -> Result<Task, AppError> {
    let updated = task::set_photo(store, id, url, now).await?;
    realtime::broadcast(conn_map, &BoardEvent::TaskUpdated { task: &updated });
    Ok(updated)
}

/// Usernames mentioned as `@name` in a chat message, deduplicated.
pub fn mentions(body: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for word in body.split_whitespace() {
        let Some(rest) = word.strip_prefix('@') else { continue };
        let name: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if !name.is_empty() && !found.contains(&name) {
            found.push(name);
        }
    }
    found
}

/// Post a chat message, push it, and notify mentioned members and, on an OP
/// thread, the OP owner.
pub async fn post_chat(
    store: &Store,
    conn_map: &ConnectionMap,
    actor: Actor,
    channel: &str,
    body: &str,
    now: DateTime<Utc>,
) -> Result<ChatMessage, AppError> {
    let message = chat::post(store, channel, actor.member_id, body, now).await?;
    realtime::broadcast(conn_map, &BoardEvent::ChatMessage { message: &message });

    let task_id = message
        .channel
        .strip_prefix("task:")
        .and_then(|id| id.parse::<i64>().ok());
    let mut notified = Vec::new();
    for username in mentions(&message.body) {
        let Some(mentioned) = member::find_auth_by_username(store, &username).await? else {
            continue;
        };
        if mentioned.id == actor.member_id {
            continue;
        }
        notified.push(mentioned.id);
        let new = NewNotification {
            recipient_id: mentioned.id,
            kind: NotificationKind::Mention,
            message: format!("{} te mencionó: {}", message.author_name, preview(&message.body)),
            task_id,
        };
        if let Err(e) = realtime::notify(conn_map, store, &new, now).await {
            log::error!("Failed to notify mention of {username}: {e}");
        }
    }

    // The OP owner hears about thread activity unless already mentioned.
    if let Some(task_id) = task_id {
        if let Some(owned) = task::find_by_id(store, task_id).await? {
            let owner = owned.owner_id.filter(|o| !notified.contains(o));
            notify_owner(
                conn_map,
                store,
                actor,
                owner,
                NotificationKind::Chat,
                format!("{} escribió en OP {}: {}", message.author_name, owned.op_number, preview(&message.body)),
                task_id,
                now,
            )
            .await;
        }
    }
    Ok(message)
}

fn preview(body: &str) -> String {
    const LEN: usize = 80;
    if body.chars().count() <= LEN {
        body.to_string()
    } else {
        let cut: String = body.chars().take(LEN).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_are_extracted_once() {
        assert_eq!(mentions("@ana mirá esto, @beto_2: y @ana otra vez"), vec!["ana", "beto_2"]);
        assert!(mentions("sin menciones @ ni correos a@b.com").is_empty());
    }

    #[test]
    fn preview_truncates_long_bodies() {
        assert_eq!(preview("corto"), "corto");
        assert_eq!(preview(&"x".repeat(100)).chars().count(), 81);
    }
}
