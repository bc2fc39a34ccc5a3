use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::models::activity::ActivityEvent;
use crate::models::chat::ChatMessage;
use crate::models::member::MemberAuth;
use crate::models::member::TeamMember;
use crate::models::notification::Notification;
use crate::models::task::Task;

/// Member row as held by the mock store.
#[derive(Debug, Clone)]
pub struct MockMember {
    pub member: TeamMember,
    pub password: String,
}

impl MockMember {
    pub fn to_auth(&self) -> MemberAuth {
        MemberAuth {
            id: self.member.id,
            username: self.member.username.clone(),
            display_name: self.member.display_name.clone(),
            password: self.password.clone(),
            is_admin: self.member.is_admin,
        }
    }
}

/// In-memory tables mirroring the Postgres schema.
#[derive(Debug, Default)]
pub struct MockData {
    pub members: Vec<MockMember>,
    /// Stored without `owner_name`; it is joined on read.
    pub tasks: Vec<Task>,
    pub activity: Vec<ActivityEvent>,
    pub chat: Vec<ChatMessage>,
    pub notifications: Vec<Notification>,
    pub tokens: HashMap<String, (i64, DateTime<Utc>)>,
    next_id: i64,
}

impl MockData {
    /// Ids are shared across tables, like a single sequence.
    pub fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn member_name(&self, id: i64) -> Option<String> {
        self.members
            .iter()
            .find(|m| m.member.id == id)
            .map(|m| m.member.display_name.clone())
    }

    /// Copy of a stored task with the owner name filled in.
    pub fn joined_task(&self, task: &Task) -> Task {
        let mut task = task.clone();
        task.owner_name = task.owner_id.and_then(|id| self.member_name(id));
        task
    }

    pub fn joined_activity(&self, event: &ActivityEvent) -> ActivityEvent {
        let mut event = event.clone();
        event.actor_name = event.actor_id.and_then(|id| self.member_name(id));
        event
    }
}

#[derive(Clone, Default)]
pub struct MockStore {
    inner: Arc<RwLock<MockData>>,
}

impl MockStore {
    pub fn read(&self) -> RwLockReadGuard<'_, MockData> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, MockData> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}
