//! Order service: transactional checkout, status transitions, listings.
//!
//! Checkout snapshots the cart into order items at current prices inside
//! one transaction and clears the cart in the same transaction. This is
//! the one invariant everything else leans on: an order never changes
//! after creation, no matter what happens to the catalog later — and a
//! double-tapped checkout sees the already-cleared cart and fails with
//! `EmptyCart` instead of duplicating the order.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::core::error::{AppError, AppResult};

/// Order lifecycle. `Fulfilled` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<OrderStatus> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "fulfilled" => Some(OrderStatus::Fulfilled),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Fulfilled | OrderStatus::Cancelled)
    }

    /// Legal transitions: pending -> confirmed -> fulfilled, and any
    /// non-terminal state -> cancelled.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::Pending, OrderStatus::Confirmed) => true,
            (OrderStatus::Confirmed, OrderStatus::Fulfilled) => true,
            (from, OrderStatus::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// An order header. Total is computed at creation and immutable after.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub address: String,
    pub phone: String,
    pub total: i64,
    pub created_at: NaiveDateTime,
}

/// Snapshot of one product at the time its order was placed.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub order_id: i64,
    pub product_id: String,
    pub title: String,
    pub quantity: i64,
    pub unit_price: i64,
}

fn row_to_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    let status_raw: String = row.get(2)?;
    Ok(Order {
        id: row.get(0)?,
        user_id: row.get(1)?,
        status: OrderStatus::parse(&status_raw).unwrap_or(OrderStatus::Pending),
        address: row.get(3)?,
        phone: row.get(4)?,
        total: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const ORDER_COLUMNS: &str = "id, user_id, status, address, phone, total, created_at";

/// Converts the user's cart into a pending order.
///
/// All in one immediate transaction: read cart lines joined to current
/// product prices, fail with `EmptyCart` if there are none, insert the
/// order and its item snapshots, clear the cart, commit.
pub fn checkout(conn: &mut Connection, user_id: i64, address: &str, phone: &str) -> AppResult<Order> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let lines: Vec<(String, String, i64, i64)> = {
        let mut stmt = tx.prepare(
            "SELECT p.id, p.title, p.price, c.quantity
             FROM cart c
             JOIN products p ON c.product_id = p.id
             WHERE c.user_id = ?1
             ORDER BY p.title",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let total: i64 = lines.iter().map(|(_, _, price, qty)| price * qty).sum();

    tx.execute(
        "INSERT INTO orders (user_id, status, address, phone, total) VALUES (?1, 'pending', ?2, ?3, ?4)",
        params![user_id, address, phone, total],
    )?;
    let order_id = tx.last_insert_rowid();

    for (product_id, title, price, quantity) in &lines {
        tx.execute(
            "INSERT INTO order_items (order_id, product_id, title, quantity, unit_price)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![order_id, product_id, title, quantity, price],
        )?;
    }

    tx.execute("DELETE FROM cart WHERE user_id = ?1", params![user_id])?;
    tx.commit()?;

    get_order(conn, order_id)
}

/// Fetches an order, failing with `NotFound` when absent.
pub fn get_order(conn: &Connection, order_id: i64) -> AppResult<Order> {
    conn.query_row(
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS),
        params![order_id],
        row_to_order,
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

/// Lists the item snapshots of an order.
pub fn order_items(conn: &Connection, order_id: i64) -> AppResult<Vec<OrderItem>> {
    let mut stmt = conn.prepare(
        "SELECT order_id, product_id, title, quantity, unit_price
         FROM order_items WHERE order_id = ?1 ORDER BY title",
    )?;
    let rows = stmt.query_map(params![order_id], |row| {
        Ok(OrderItem {
            order_id: row.get(0)?,
            product_id: row.get(1)?,
            title: row.get(2)?,
            quantity: row.get(3)?,
            unit_price: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Moves an order to a new status, validating the transition.
/// Precondition: admin role.
pub fn update_status(conn: &Connection, order_id: i64, new_status: OrderStatus) -> AppResult<Order> {
    let order = get_order(conn, order_id)?;

    if !order.status.can_transition_to(new_status) {
        return Err(AppError::InvalidTransition {
            from: order.status.as_str().to_string(),
            to: new_status.as_str().to_string(),
        });
    }

    conn.execute(
        "UPDATE orders SET status = ?1 WHERE id = ?2",
        params![new_status.as_str(), order_id],
    )?;
    get_order(conn, order_id)
}

/// Lists a user's orders, newest first.
pub fn list_for_user(conn: &Connection, user_id: i64) -> AppResult<Vec<Order>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        ORDER_COLUMNS
    ))?;
    let rows = stmt.query_map(params![user_id], row_to_order)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Lists all orders for the admin board, optionally filtered by status,
/// newest first.
pub fn list_all(conn: &Connection, status: Option<OrderStatus>) -> AppResult<Vec<Order>> {
    let mut result = Vec::new();
    match status {
        Some(s) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM orders WHERE status = ?1 ORDER BY created_at DESC, id DESC",
                ORDER_COLUMNS
            ))?;
            let rows = stmt.query_map(params![s.as_str()], row_to_order)?;
            for row in rows {
                result.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM orders ORDER BY created_at DESC, id DESC",
                ORDER_COLUMNS
            ))?;
            let rows = stmt.query_map([], row_to_order)?;
            for row in rows {
                result.push(row?);
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_matrix() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Fulfilled));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));

        // Skipping confirmation is rejected
        assert!(!Pending.can_transition_to(Fulfilled));
        // Terminal states reject everything
        assert!(!Fulfilled.can_transition_to(Cancelled));
        assert!(!Fulfilled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Cancelled));
        // No going backwards
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Fulfilled,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
    }
}
