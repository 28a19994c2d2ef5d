//! End-to-end storage tests against a real SQLite file: the checkout
//! invariants, the cart laws, the question limit, and role handling.

use std::sync::{Arc, Barrier};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use verdura::core::error::AppError;
use verdura::storage::cart::{add_to_cart, view_cart};
use verdura::storage::catalog::{create_category, create_product, update_product_field, ProductField, ProductValue};
use verdura::storage::db::{ensure_user, stored_role, Role};
use verdura::storage::orders::{checkout, get_order, list_for_user, order_items, update_status, OrderStatus};
use verdura::storage::questions;
use verdura::storage::{create_pool, DbPool};

struct TestDb {
    pool: DbPool,
    // Held so the directory outlives the pool
    _dir: TempDir,
}

fn test_db() -> TestDb {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("test.sqlite");
    let pool = create_pool(path.to_str().expect("non-utf8 temp path")).expect("Failed to create pool");
    TestDb { pool, _dir: dir }
}

fn seed_user_and_catalog(db: &TestDb) {
    let conn = db.pool.get().expect("pool");
    ensure_user(&conn, 100, Some("alice")).expect("user");
    create_category(&conn, "Premium").expect("category");
    create_product(&conn, "P1", "first", None, 500, "premium").expect("p1");
    create_product(&conn, "P2", "second", None, 300, "premium").expect("p2");
}

#[test]
fn adding_twice_yields_quantity_two() {
    let db = test_db();
    seed_user_and_catalog(&db);
    let conn = db.pool.get().expect("pool");

    add_to_cart(&conn, 100, "p1").expect("first add");
    add_to_cart(&conn, 100, "p1").expect("second add");

    let view = view_cart(&conn, 100).expect("view");
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 2);
}

#[test]
fn checkout_on_empty_cart_fails_and_creates_nothing() {
    let db = test_db();
    seed_user_and_catalog(&db);
    let mut conn = db.pool.get().expect("pool");

    let result = checkout(&mut conn, 100, "X street", "+66 81 234 5678");
    assert!(matches!(result, Err(AppError::EmptyCart)));

    let orders = list_for_user(&conn, 100).expect("list");
    assert!(orders.is_empty());
}

#[test]
fn checkout_snapshot_scenario() {
    // User adds P1 (500) x2 and P2 (300) x1, checks out with address "X":
    // total 1300, two item snapshots, cart empty afterwards.
    let db = test_db();
    seed_user_and_catalog(&db);
    let mut conn = db.pool.get().expect("pool");

    add_to_cart(&conn, 100, "p1").expect("add p1");
    add_to_cart(&conn, 100, "p1").expect("add p1 again");
    add_to_cart(&conn, 100, "p2").expect("add p2");

    let order = checkout(&mut conn, 100, "X", "+66 81 234 5678").expect("checkout");

    assert_eq!(order.total, 1300);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.address, "X");

    let items = order_items(&conn, order.id).expect("items");
    assert_eq!(items.len(), 2);

    let p1 = items.iter().find(|i| i.product_id == "p1").expect("p1 snapshot");
    assert_eq!((p1.quantity, p1.unit_price), (2, 500));
    let p2 = items.iter().find(|i| i.product_id == "p2").expect("p2 snapshot");
    assert_eq!((p2.quantity, p2.unit_price), (1, 300));

    assert!(view_cart(&conn, 100).expect("view").is_empty());
}

#[test]
fn double_submitted_checkout_creates_one_order() {
    let db = test_db();
    seed_user_and_catalog(&db);
    let mut conn = db.pool.get().expect("pool");

    add_to_cart(&conn, 100, "p1").expect("add");
    checkout(&mut conn, 100, "X", "+66 81 234 5678").expect("first submit");

    // The cart was cleared in the same transaction, so a duplicate
    // submission sees an empty cart
    let second = checkout(&mut conn, 100, "X", "+66 81 234 5678");
    assert!(matches!(second, Err(AppError::EmptyCart)));
    assert_eq!(list_for_user(&conn, 100).expect("list").len(), 1);
}

#[test]
fn price_edits_never_touch_existing_orders() {
    let db = test_db();
    seed_user_and_catalog(&db);
    let mut conn = db.pool.get().expect("pool");

    add_to_cart(&conn, 100, "p1").expect("add");
    let order = checkout(&mut conn, 100, "X", "+66 81 234 5678").expect("checkout");

    update_product_field(&conn, "p1", ProductField::Price, &ProductValue::Amount(99999)).expect("price edit");

    let items = order_items(&conn, order.id).expect("items");
    assert_eq!(items[0].unit_price, 500);
    assert_eq!(get_order(&conn, order.id).expect("order").total, 500);
}

#[test]
fn order_items_survive_product_deletion() {
    let db = test_db();
    seed_user_and_catalog(&db);
    let mut conn = db.pool.get().expect("pool");

    add_to_cart(&conn, 100, "p1").expect("add");
    let order = checkout(&mut conn, 100, "X", "+66 81 234 5678").expect("checkout");

    verdura::storage::catalog::delete_product(&conn, "p1").expect("delete");

    let items = order_items(&conn, order.id).expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "P1");
}

#[test]
fn fourth_pending_question_fails_with_limit() {
    let db = test_db();
    seed_user_and_catalog(&db);
    let mut conn = db.pool.get().expect("pool");

    for i in 0..3 {
        questions::submit(&mut conn, 100, Some("alice"), &format!("question {}", i)).expect("submit");
    }
    let fourth = questions::submit(&mut conn, 100, Some("alice"), "one too many");
    assert!(matches!(fourth, Err(AppError::QuestionLimitExceeded { pending: 3 })));
}

#[test]
fn concurrent_submissions_cannot_exceed_the_pending_limit() {
    // Eight parallel submissions from one user over separate pooled
    // connections; only three may land
    let db = test_db();
    seed_user_and_catalog(&db);

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pool = db.pool.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                let mut conn = pool.get().expect("pool");
                barrier.wait();
                questions::submit(&mut conn, 100, Some("alice"), &format!("question {}", i)).is_ok()
            })
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .filter(|accepted| *accepted)
        .count();
    assert_eq!(accepted, 3);

    let conn = db.pool.get().expect("pool");
    assert_eq!(questions::pending_count(&conn, 100).expect("count"), 3);
}

#[test]
fn illegal_status_transitions_are_rejected() {
    let db = test_db();
    seed_user_and_catalog(&db);
    let mut conn = db.pool.get().expect("pool");

    add_to_cart(&conn, 100, "p1").expect("add");
    let order = checkout(&mut conn, 100, "X", "+66 81 234 5678").expect("checkout");

    // Skipping confirmation is rejected
    let skipped = update_status(&conn, order.id, OrderStatus::Fulfilled);
    assert!(matches!(skipped, Err(AppError::InvalidTransition { .. })));

    update_status(&conn, order.id, OrderStatus::Confirmed).expect("confirm");
    update_status(&conn, order.id, OrderStatus::Fulfilled).expect("fulfil");

    // Terminal states reject everything
    let reopened = update_status(&conn, order.id, OrderStatus::Cancelled);
    assert!(matches!(reopened, Err(AppError::InvalidTransition { .. })));
}

#[test]
fn unknown_users_resolve_to_customer() {
    let db = test_db();
    let conn = db.pool.get().expect("pool");

    ensure_user(&conn, 7, None).expect("user");
    assert_eq!(stored_role(&conn, 7).expect("role"), Role::Customer);

    // Promotion is explicit, never implied
    verdura::storage::db::set_user_role(&conn, 7, Role::Admin).expect("promote");
    assert_eq!(stored_role(&conn, 7).expect("role"), Role::Admin);
}

#[test]
fn unauthorized_error_carries_a_user_message() {
    let err = AppError::Unauthorized("delete product".to_string());
    let message = err.user_message().expect("unauthorized is user facing");
    assert!(message.to_lowercase().contains("permitted") || message.to_lowercase().contains("allowed"));
}
