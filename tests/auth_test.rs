//! Credential checks, demo seeding and member creation.

use opboard::db::seed;
use opboard::errors::AppError;
use opboard::models::member::{self, NewMember};

mod common;
use common::{DEMO_PASS, empty_store, seed_time, seeded_store};

#[tokio::test]
async fn seeded_members_log_in_with_the_demo_password() {
    let store = seeded_store().await;
    let found = member::verify_credentials(&store, "carla", DEMO_PASS)
        .await
        .expect("verify")
        .expect("carla exists");
    assert_eq!(found.display_name, "Carla Ruiz");
    assert!(!found.is_admin);

    assert!(member::verify_credentials(&store, "carla", "nope").await.expect("verify").is_none());
    assert!(member::verify_credentials(&store, "nadie", DEMO_PASS).await.expect("verify").is_none());

    let admins = member::find_admin_ids(&store).await.expect("admins");
    assert_eq!(admins.len(), 1);
}

#[tokio::test]
async fn seed_if_empty_runs_once() {
    let store = empty_store();
    seed::seed_if_empty(&store, "first-pass", seed_time()).await.expect("seed");
    assert_eq!(member::count(&store).await.expect("count") as usize, seed::demo_member_count());

    seed::seed_if_empty(&store, "second-pass", seed_time()).await.expect("reseed");
    assert_eq!(member::count(&store).await.expect("count") as usize, seed::demo_member_count());
    // The first password is still the one that works.
    assert!(member::verify_credentials(&store, "admin", "first-pass").await.expect("verify").is_some());
}

#[tokio::test]
async fn duplicate_usernames_are_rejected() {
    let store = seeded_store().await;
    let new = NewMember {
        username: " ana ".to_string(),
        password: "hash".to_string(),
        display_name: "Otra Ana".to_string(),
        role_label: "Diseño".to_string(),
        productivity: 1.0,
        is_admin: false,
    };
    let result = member::create(&store, &new).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(member::count(&store).await.expect("count") as usize, seed::demo_member_count());
}
