//! Dialog-state and role-resolution tests: the flows advance step by
//! step, cancel returns to Idle, and the capability check combines the
//! configured admin ids with the stored role.

use std::collections::HashSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use teloxide::types::ChatId;

use verdura::core::error::AppError;
use verdura::session::{DialogState, SessionTracker};
use verdura::storage::catalog::{create_category, create_product, get_product, list_products};
use verdura::storage::db::{set_user_role, Role};
use verdura::storage::create_pool;
use verdura::telegram::handlers::types::{require_admin, resolve_role, HandlerDeps, UserInfo};

fn deps_with_admins(admin_ids: &[i64]) -> (HandlerDeps, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("test.sqlite");
    let pool = create_pool(path.to_str().expect("non-utf8 temp path")).expect("Failed to create pool");

    let deps = HandlerDeps::new(
        Arc::new(pool),
        Arc::new(SessionTracker::new()),
        Arc::new(admin_ids.iter().copied().collect::<HashSet<i64>>()),
    );
    (deps, dir)
}

fn user(id: i64) -> UserInfo {
    UserInfo {
        user_id: id,
        username: Some(format!("user{}", id)),
    }
}

#[test]
fn configured_admin_ids_grant_admin() {
    let (deps, _dir) = deps_with_admins(&[42]);

    assert_eq!(resolve_role(&deps, &user(42)).expect("role"), Role::Admin);
    assert_eq!(resolve_role(&deps, &user(7)).expect("role"), Role::Customer);
}

#[test]
fn stored_role_grants_admin_without_configuration() {
    let (deps, _dir) = deps_with_admins(&[]);

    // First contact creates the row as a customer
    assert_eq!(resolve_role(&deps, &user(7)).expect("role"), Role::Customer);

    let conn = deps.db_pool.get().expect("pool");
    set_user_role(&conn, 7, Role::Admin).expect("promote");
    drop(conn);

    assert_eq!(resolve_role(&deps, &user(7)).expect("role"), Role::Admin);
}

#[test]
fn demotion_takes_effect_on_next_resolution() {
    let (deps, _dir) = deps_with_admins(&[]);
    resolve_role(&deps, &user(7)).expect("create row");

    let conn = deps.db_pool.get().expect("pool");
    set_user_role(&conn, 7, Role::Admin).expect("promote");
    set_user_role(&conn, 7, Role::Customer).expect("demote");
    drop(conn);

    assert_eq!(resolve_role(&deps, &user(7)).expect("role"), Role::Customer);
}

#[test]
fn customers_are_stopped_at_the_admin_gate_without_mutation() {
    let (deps, _dir) = deps_with_admins(&[42]);
    {
        let conn = deps.db_pool.get().expect("pool");
        create_category(&conn, "Premium").expect("category");
        create_product(&conn, "P1", "first", None, 500, "premium").expect("p1");
    }

    // The gate every adm: callback passes through before any service runs
    let denied = require_admin(&deps, &user(7), "callback adm:prod:del:p1");
    assert!(matches!(denied, Err(AppError::Unauthorized(_))));

    // Nothing was touched: the product is still there, alone
    let conn = deps.db_pool.get().expect("pool");
    assert!(get_product(&conn, "p1").is_ok());
    assert_eq!(list_products(&conn, None).expect("list").len(), 1);
}

#[test]
fn admins_pass_the_gate() {
    let (deps, _dir) = deps_with_admins(&[42]);

    assert_eq!(require_admin(&deps, &user(42), "button orders").expect("role"), Role::Admin);

    // A stored role counts the same as a configured id
    resolve_role(&deps, &user(7)).expect("create row");
    let conn = deps.db_pool.get().expect("pool");
    set_user_role(&conn, 7, Role::Admin).expect("promote");
    drop(conn);
    assert_eq!(require_admin(&deps, &user(7), "button orders").expect("role"), Role::Admin);
}

#[tokio::test]
async fn checkout_flow_advances_step_by_step() {
    let tracker = SessionTracker::new();
    let chat = ChatId(100);

    assert!(!tracker.in_flow(chat).await);

    tracker.set_state(chat, DialogState::AwaitingShippingAddress).await;
    assert!(tracker.in_flow(chat).await);

    tracker
        .set_state(
            chat,
            DialogState::AwaitingPhone {
                address: "X street 1".to_string(),
            },
        )
        .await;

    match tracker.get_state(chat).await {
        DialogState::AwaitingPhone { address } => assert_eq!(address, "X street 1"),
        other => panic!("unexpected state: {:?}", other),
    }

    // Completing (or cancelling) the flow clears the entry entirely
    tracker.clear_state(chat).await;
    assert_eq!(tracker.get_state(chat).await, DialogState::Idle);
}

#[tokio::test]
async fn product_wizard_carries_all_collected_fields() {
    let tracker = SessionTracker::new();
    let chat = ChatId(200);

    tracker.set_state(chat, DialogState::AwaitingProductTitle).await;
    tracker
        .set_state(
            chat,
            DialogState::AwaitingProductCategory {
                title: "Thai".to_string(),
                description: "desc".to_string(),
                image: None,
                price: 9900,
            },
        )
        .await;

    match tracker.get_state(chat).await {
        DialogState::AwaitingProductCategory {
            title,
            description,
            image,
            price,
        } => {
            assert_eq!(title, "Thai");
            assert_eq!(description, "desc");
            assert_eq!(image, None);
            assert_eq!(price, 9900);
        }
        other => panic!("unexpected state: {:?}", other),
    }
}

#[tokio::test]
async fn flows_are_isolated_per_chat() {
    let tracker = SessionTracker::new();

    tracker.set_state(ChatId(1), DialogState::AwaitingQuestion).await;
    tracker
        .set_state(ChatId(2), DialogState::AwaitingAnswer { question_id: 5 })
        .await;

    assert_eq!(tracker.get_state(ChatId(1)).await, DialogState::AwaitingQuestion);
    assert_eq!(
        tracker.get_state(ChatId(2)).await,
        DialogState::AwaitingAnswer { question_id: 5 }
    );

    tracker.clear_state(ChatId(1)).await;
    assert!(!tracker.in_flow(ChatId(1)).await);
    assert!(tracker.in_flow(ChatId(2)).await);
}
