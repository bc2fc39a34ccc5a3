//! Chat threads, mentions and notification read state.

use chrono::Duration;

use opboard::errors::AppError;
use opboard::models::chat;
use opboard::models::notification::{self, NotificationKind};
use opboard::operations::{self, Actor};
use opboard::realtime;

mod common;
use common::{connections, member_id, seed_time, seeded_store, task_by_op};

#[tokio::test]
async fn messages_come_back_oldest_first_per_channel() {
    let store = seeded_store().await;
    let conns = connections();
    let ana = Actor { member_id: member_id(&store, "ana").await };
    let op = task_by_op(&store, "OP-2401").await;
    let thread = chat::task_channel(op.id);

    operations::post_chat(&store, &conns, ana, "general", "Buen día", seed_time())
        .await
        .expect("post general");
    operations::post_chat(&store, &conns, ana, &thread, "Falta el logo", seed_time())
        .await
        .expect("post thread");
    operations::post_chat(&store, &conns, ana, &thread, "Ya llegó", seed_time() + Duration::minutes(5))
        .await
        .expect("post thread");

    let general = chat::find_recent(&store, "general", 50).await.expect("general");
    assert_eq!(general.len(), 1);
    assert_eq!(general[0].author_name, "Ana Pérez");

    let messages = chat::find_recent(&store, &thread, 50).await.expect("thread");
    let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["Falta el logo", "Ya llegó"]);

    // Unknown channels land in general.
    operations::post_chat(&store, &conns, ana, "otro", "Hola", seed_time())
        .await
        .expect("post fallback");
    assert_eq!(chat::find_recent(&store, "general", 50).await.expect("general").len(), 2);
}

#[tokio::test]
async fn blank_messages_are_rejected() {
    let store = seeded_store().await;
    let conns = connections();
    let ana = Actor { member_id: member_id(&store, "ana").await };
    let result = operations::post_chat(&store, &conns, ana, "general", "   ", seed_time()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(chat::find_recent(&store, "general", 50).await.expect("general").is_empty());
}

#[tokio::test]
async fn mentions_notify_other_members_only() {
    let store = seeded_store().await;
    let conns = connections();
    let ana = member_id(&store, "ana").await;
    let beto = member_id(&store, "beto").await;
    let op = task_by_op(&store, "OP-2403").await;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    realtime::register(&conns, beto, tx);

    operations::post_chat(
        &store,
        &conns,
        Actor { member_id: ana },
        &chat::task_channel(op.id),
        "@beto @ana @nadie revisá la lona",
        seed_time(),
    )
    .await
    .expect("post");

    assert_eq!(notification::count_unread(&store, ana).await, 0);
    let received = notification::find_for_member(&store, beto, 10).await.expect("list");
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].kind, NotificationKind::Mention);
    assert_eq!(received[0].task_id, Some(op.id));
    assert!(received[0].message.starts_with("Ana Pérez te mencionó"));

    let mut types = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        let json: serde_json::Value = serde_json::from_str(&msg).expect("json");
        types.push(json["type"].as_str().unwrap_or_default().to_string());
    }
    assert_eq!(types, vec!["chat_message", "notification"]);
}

#[tokio::test]
async fn thread_posts_notify_the_op_owner() {
    let store = seeded_store().await;
    let conns = connections();
    let beto = member_id(&store, "beto").await;
    let carla = member_id(&store, "carla").await;
    let op = task_by_op(&store, "OP-2403").await;
    let thread = chat::task_channel(op.id);

    operations::post_chat(&store, &conns, Actor { member_id: carla }, &thread, "Ojales listos", seed_time())
        .await
        .expect("post");
    let received = notification::find_for_member(&store, beto, 10).await.expect("list");
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].kind, NotificationKind::Chat);
    assert_eq!(received[0].task_id, Some(op.id));
    assert!(received[0].message.contains("OP-2403"));

    // The owner's own posts and general chat do not notify them.
    operations::post_chat(&store, &conns, Actor { member_id: beto }, &thread, "Gracias", seed_time())
        .await
        .expect("own post");
    operations::post_chat(&store, &conns, Actor { member_id: carla }, "general", "Hola", seed_time())
        .await
        .expect("general post");
    assert_eq!(notification::count_unread(&store, beto).await, 1);
}

#[tokio::test]
async fn read_state_is_per_recipient() {
    let store = seeded_store().await;
    let conns = connections();
    let ana = member_id(&store, "ana").await;
    let beto = member_id(&store, "beto").await;

    for body in ["@beto uno", "@beto dos"] {
        operations::post_chat(&store, &conns, Actor { member_id: ana }, "general", body, seed_time())
            .await
            .expect("post");
    }
    let list = notification::find_for_member(&store, beto, 10).await.expect("list");
    assert_eq!(list.len(), 2);

    // Someone else cannot mark beto's notification.
    assert!(!notification::mark_read(&store, list[0].id, ana).await.expect("mark"));
    assert!(notification::mark_read(&store, list[0].id, beto).await.expect("mark"));
    assert!(!notification::mark_read(&store, list[0].id, beto).await.expect("mark again"));
    assert_eq!(notification::count_unread(&store, beto).await, 1);

    assert_eq!(notification::mark_all_read(&store, beto).await.expect("all"), 1);
    assert_eq!(notification::count_unread(&store, beto).await, 0);
}
