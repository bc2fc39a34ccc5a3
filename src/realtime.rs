//! Realtime push: committed board changes fan out to every open WebSocket.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::db::Store;
use crate::errors::AppError;
use crate::models::activity::ActivityEvent;
use crate::models::chat::ChatMessage;
use crate::models::notification::{self, NewNotification, Notification};
use crate::models::task::Task;

/// Open sockets per member id.
pub type ConnectionMap = Arc<RwLock<HashMap<i64, Vec<mpsc::UnboundedSender<String>>>>>;

pub fn new_connection_map() -> ConnectionMap {
    Arc::new(RwLock::new(HashMap::new()))
}

/// Messages pushed to clients, tagged by `type`. Every event carries the
/// ids a client needs to drop duplicates of its own writes.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent<'a> {
    TaskCreated { task: &'a Task },
    TaskUpdated { task: &'a Task },
    TaskMoved { task: &'a Task, activity: Option<&'a ActivityEvent> },
    TaskDeleted { task_id: i64 },
    ActivityAdded { activity: &'a ActivityEvent },
    ChatMessage { message: &'a ChatMessage },
    Notification { notification: &'a Notification, unread_count: i64 },
    CountUpdate { unread_count: i64 },
}

impl BoardEvent<'_> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::error!("Failed to serialize board event: {e}");
            String::from("{}")
        })
    }
}

pub fn register(conn_map: &ConnectionMap, member_id: i64, tx: mpsc::UnboundedSender<String>) {
    let mut map = conn_map.write().unwrap_or_else(|e| e.into_inner());
    map.entry(member_id).or_default().push(tx);
}

/// Drop closed senders for a member after its socket ends.
pub fn unregister_closed(conn_map: &ConnectionMap, member_id: i64) {
    let mut map = conn_map.write().unwrap_or_else(|e| e.into_inner());
    if let Some(senders) = map.get_mut(&member_id) {
        senders.retain(|s| !s.is_closed());
        if senders.is_empty() {
            map.remove(&member_id);
        }
    }
}

pub fn connection_count(conn_map: &ConnectionMap) -> usize {
    let map = conn_map.read().unwrap_or_else(|e| e.into_inner());
    map.values().map(Vec::len).sum()
}

/// Send an event to every connected member.
pub fn broadcast(conn_map: &ConnectionMap, event: &BoardEvent<'_>) {
    let msg = event.to_json();
    let map = conn_map.read().unwrap_or_else(|e| e.into_inner());
    for senders in map.values() {
        for sender in senders {
            let _ = sender.send(msg.clone());
        }
    }
}

/// Send an event to one member's sockets only.
pub fn send_to(conn_map: &ConnectionMap, member_id: i64, event: &BoardEvent<'_>) {
    let map = conn_map.read().unwrap_or_else(|e| e.into_inner());
    if let Some(senders) = map.get(&member_id) {
        let msg = event.to_json();
        for sender in senders {
            let _ = sender.send(msg.clone());
        }
    }
}

/// Store a notification and push it, with the fresh unread count, to the
/// recipient.
pub async fn notify(
    conn_map: &ConnectionMap,
    store: &Store,
    new: &NewNotification,
    now: DateTime<Utc>,
) -> Result<Notification, AppError> {
    let stored = notification::create(store, new, now).await?;
    let unread_count = notification::count_unread(store, new.recipient_id).await;
    send_to(
        conn_map,
        new.recipient_id,
        &BoardEvent::Notification { notification: &stored, unread_count },
    );
    Ok(stored)
}

/// Push the current unread count to a member (after marking read).
pub async fn send_count_update(conn_map: &ConnectionMap, store: &Store, member_id: i64) {
    let unread_count = notification::count_unread(store, member_id).await;
    send_to(conn_map, member_id, &BoardEvent::CountUpdate { unread_count });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_every_member_and_send_to_only_one() {
        let map = new_connection_map();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        register(&map, 1, tx1);
        register(&map, 2, tx2);
        assert_eq!(connection_count(&map), 2);

        broadcast(&map, &BoardEvent::TaskDeleted { task_id: 9 });
        assert_eq!(rx1.try_recv().unwrap(), r#"{"type":"task_deleted","task_id":9}"#);
        assert!(rx2.try_recv().is_ok());

        send_to(&map, 2, &BoardEvent::CountUpdate { unread_count: 3 });
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap(), r#"{"type":"count_update","unread_count":3}"#);
    }

    #[test]
    fn closed_senders_are_pruned() {
        let map = new_connection_map();
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        register(&map, 5, tx);
        drop(rx);
        unregister_closed(&map, 5);
        assert_eq!(connection_count(&map), 0);
    }
}
