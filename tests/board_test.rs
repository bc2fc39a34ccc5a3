//! Moves, edits and deletes through the operations layer, against the
//! seeded mock store.

use chrono::Duration;

use opboard::models::activity;
use opboard::models::board;
use opboard::models::notification;
use opboard::models::stage::{Priority, Stage};
use opboard::models::task::{self, BoardQuery, NewTask, TaskFilter, TaskUpdate};
use opboard::operations::{self, Actor};
use opboard::realtime;

mod common;
use common::{connections, member_id, seed_time, seeded_store, task_by_op};

#[tokio::test]
async fn seed_loads_every_demo_op() {
    let store = seeded_store().await;
    let tasks = task::find_all(&store).await.expect("list");
    assert_eq!(tasks.len(), opboard::db::seed::demo_task_count());

    let columns = board::group_by_stage(tasks);
    assert_eq!(columns.len(), 10);
    let delivered = columns.iter().find(|c| c.config.stage == Stage::Entrega).expect("entrega column");
    assert_eq!(delivered.tasks.len(), 2);
}

#[tokio::test]
async fn move_logs_once_and_delivery_completes_progress() {
    let store = seeded_store().await;
    let conns = connections();
    let admin = Actor { member_id: member_id(&store, "admin").await };
    let op = task_by_op(&store, "OP-2408").await;
    let before = activity::count_for_task(&store, op.id).await.expect("count");

    let now = seed_time() + Duration::hours(1);
    let (moved, event) = operations::move_task(&store, &conns, admin, op.id, Stage::Entrega, now)
        .await
        .expect("move");
    assert_eq!(moved.status, Stage::Entrega);
    assert_eq!(moved.progress, 100);
    assert_eq!(moved.sector, Stage::Entrega.sector());
    let event = event.expect("a status change is logged");
    assert_eq!(event.from_status, Some(Stage::Instalacion));
    assert_eq!(event.to_status, Stage::Entrega);
    assert_eq!(activity::count_for_task(&store, op.id).await.expect("count"), before + 1);

    // Same stage again: no change, no log.
    let (_, again) = operations::move_task(&store, &conns, admin, op.id, Stage::Entrega, now)
        .await
        .expect("noop move");
    assert!(again.is_none());
    assert_eq!(activity::count_for_task(&store, op.id).await.expect("count"), before + 1);
}

#[tokio::test]
async fn moving_someone_elses_op_notifies_the_owner() {
    let store = seeded_store().await;
    let conns = connections();
    let admin = Actor { member_id: member_id(&store, "admin").await };
    let ana = member_id(&store, "ana").await;
    let op = task_by_op(&store, "OP-2401").await;
    assert_eq!(op.owner_id, Some(ana));

    operations::move_task(&store, &conns, admin, op.id, Stage::Aprobacion, seed_time())
        .await
        .expect("move");
    assert_eq!(notification::count_unread(&store, ana).await, 1);

    // The owner moving their own OP is not told about it.
    operations::move_task(&store, &conns, Actor { member_id: ana }, op.id, Stage::Impresion, seed_time())
        .await
        .expect("move");
    assert_eq!(notification::count_unread(&store, ana).await, 1);
}

#[tokio::test]
async fn edit_without_status_change_adds_no_activity() {
    let store = seeded_store().await;
    let conns = connections();
    let admin = Actor { member_id: member_id(&store, "admin").await };
    let op = task_by_op(&store, "OP-2406").await;
    let before = activity::count_for_task(&store, op.id).await.expect("count");

    let mut update = TaskUpdate::from_task(&op);
    update.title = "Heladería Polo (sucursal 2)".to_string();
    update.priority = Priority::Alta;
    update.progress = 40;
    let (updated, event) = operations::update_task(&store, &conns, admin, op.id, update, seed_time())
        .await
        .expect("update");
    assert!(event.is_none());
    assert_eq!(updated.title, "Heladería Polo (sucursal 2)");
    assert_eq!(updated.priority, Priority::Alta);
    assert_eq!(updated.progress, 40);
    assert_eq!(activity::count_for_task(&store, op.id).await.expect("count"), before);

    let mut update = TaskUpdate::from_task(&updated);
    update.status = Stage::Instalacion;
    let (_, event) = operations::update_task(&store, &conns, admin, op.id, update, seed_time())
        .await
        .expect("update with status");
    assert_eq!(event.expect("logged").to_status, Stage::Instalacion);
    assert_eq!(activity::count_for_task(&store, op.id).await.expect("count"), before + 1);
}

#[tokio::test]
async fn create_logs_entry_and_delete_removes_history() {
    let store = seeded_store().await;
    let conns = connections();
    let admin = Actor { member_id: member_id(&store, "admin").await };

    let new = NewTask {
        op_number: "OP-9000".to_string(),
        title: "Cliente de prueba".to_string(),
        summary: String::new(),
        status: None,
        priority: None,
        owner_id: None,
        created_by: "admin".to_string(),
        tags: vec!["prueba".to_string()],
        materials: Vec::new(),
        impact: None,
        due_date: None,
    };
    let created = operations::create_task(&store, &conns, admin, &new, seed_time())
        .await
        .expect("create");
    assert_eq!(created.status, Stage::Pendiente);
    assert_eq!(created.priority, Priority::Media);
    assert_eq!(created.progress, 0);
    assert_eq!(activity::count_for_task(&store, created.id).await.expect("count"), 1);

    operations::delete_task(&store, &conns, created.id).await.expect("delete");
    assert!(task::find_by_id(&store, created.id).await.expect("find").is_none());
    assert_eq!(activity::count_for_task(&store, created.id).await.expect("count"), 0);

    let missing = operations::delete_task(&store, &conns, created.id).await;
    assert!(matches!(missing, Err(opboard::errors::AppError::NotFound)));
}

#[tokio::test]
async fn board_filters_combine() {
    let store = seeded_store().await;
    let beto = member_id(&store, "beto").await;
    let all = task::find_all(&store).await.expect("list");

    let by_owner = TaskFilter::from_query(&BoardQuery {
        owner: Some(beto.to_string()),
        ..Default::default()
    });
    assert_eq!(by_owner.apply(all.clone()).len(), 4);

    let unassigned = TaskFilter::from_query(&BoardQuery {
        owner: Some("sin_asignar".to_string()),
        ..Default::default()
    });
    let found = unassigned.apply(all.clone());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].op_number, "OP-2410");

    let combined = TaskFilter::from_query(&BoardQuery {
        owner: Some(beto.to_string()),
        status: Some("impresion".to_string()),
        priority: Some("alta".to_string()),
        q: Some("  TRIBUNA ".to_string()),
    });
    let found = combined.apply(all);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].op_number, "OP-2403");
}

#[tokio::test]
async fn connected_clients_receive_move_events() {
    let store = seeded_store().await;
    let conns = connections();
    let admin = member_id(&store, "admin").await;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    realtime::register(&conns, admin, tx);

    let op = task_by_op(&store, "OP-2409").await;
    operations::move_task(&store, &conns, Actor { member_id: admin }, op.id, Stage::Taller, seed_time())
        .await
        .expect("move");

    let msg = rx.try_recv().expect("event pushed");
    let json: serde_json::Value = serde_json::from_str(&msg).expect("json");
    assert_eq!(json["type"], "task_moved");
    assert_eq!(json["task"]["status"], "taller");
    assert_eq!(json["activity"]["to_status"], "taller");
}
