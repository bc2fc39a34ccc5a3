//! Shared setup for the integration tests: an in-memory store loaded with
//! the demo dataset.

#![allow(dead_code)]

use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};

use opboard::auth::password;
use opboard::db::{Store, seed};
use opboard::models::member;
use opboard::models::task::{self, Task};
use opboard::realtime::{self, ConnectionMap};

pub const DEMO_PASS: &str = "demo-pass-123";

/// Fixed clock for seeded data: 2024-06-03 12:00 UTC.
pub fn seed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
}

/// Argon2 is slow in debug builds; hash the demo password once per binary.
fn demo_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| password::hash_password(DEMO_PASS).expect("hash demo password"))
}

/// Empty mock store.
pub fn empty_store() -> Store {
    Store::mock()
}

/// Mock store with the demo members and OPs, seeded at [`seed_time`].
pub async fn seeded_store() -> Store {
    let store = Store::mock();
    seed::seed_demo(&store, demo_hash(), seed_time())
        .await
        .expect("seed demo data");
    store
}

pub fn connections() -> ConnectionMap {
    realtime::new_connection_map()
}

pub async fn task_by_op(store: &Store, op_number: &str) -> Task {
    task::find_all(store)
        .await
        .expect("list tasks")
        .into_iter()
        .find(|t| t.op_number == op_number)
        .unwrap_or_else(|| panic!("{op_number} not seeded"))
}

pub async fn member_id(store: &Store, username: &str) -> i64 {
    member::find_auth_by_username(store, username)
        .await
        .expect("lookup member")
        .unwrap_or_else(|| panic!("{username} not seeded"))
        .id
}
