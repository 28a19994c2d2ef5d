//! Cart service: per-user mapping of product to quantity.
//!
//! One row per (user, product); repeated adds accumulate quantity, a
//! quantity of zero removes the line, and the whole cart is cleared
//! inside the checkout transaction.

use rusqlite::{params, Connection};

use crate::core::error::{AppError, AppResult};

/// One cart line joined with its product, as shown to the user.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: String,
    pub title: String,
    pub unit_price: i64,
    pub quantity: i64,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.unit_price * self.quantity
    }
}

/// A cart rendered for display: ordered lines plus the running total.
#[derive(Debug, Clone, Default)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: i64,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Adds one unit of a product to the user's cart, creating the line or
/// incrementing an existing one. Fails with `NotFound` for stale ids.
///
/// Returns the new quantity of the line.
pub fn add_to_cart(conn: &Connection, user_id: i64, product_id: &str) -> AppResult<i64> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) FROM products WHERE id = ?1",
        params![product_id],
        |row| Ok(row.get::<_, i64>(0)? > 0),
    )?;
    if !exists {
        return Err(AppError::NotFound("Product".to_string()));
    }

    conn.execute(
        "INSERT INTO cart (user_id, product_id, quantity) VALUES (?1, ?2, 1)
         ON CONFLICT(user_id, product_id) DO UPDATE SET quantity = quantity + 1",
        params![user_id, product_id],
    )?;

    let quantity: i64 = conn.query_row(
        "SELECT quantity FROM cart WHERE user_id = ?1 AND product_id = ?2",
        params![user_id, product_id],
        |row| row.get(0),
    )?;
    Ok(quantity)
}

/// Sets the quantity of a cart line; zero removes it. Idempotent per call.
pub fn set_quantity(conn: &Connection, user_id: i64, product_id: &str, quantity: i64) -> AppResult<()> {
    if quantity < 0 {
        return Err(AppError::Validation("Quantity cannot be negative.".to_string()));
    }

    if quantity == 0 {
        conn.execute(
            "DELETE FROM cart WHERE user_id = ?1 AND product_id = ?2",
            params![user_id, product_id],
        )?;
        return Ok(());
    }

    let exists: bool = conn.query_row(
        "SELECT COUNT(*) FROM products WHERE id = ?1",
        params![product_id],
        |row| Ok(row.get::<_, i64>(0)? > 0),
    )?;
    if !exists {
        return Err(AppError::NotFound("Product".to_string()));
    }

    conn.execute(
        "INSERT INTO cart (user_id, product_id, quantity) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id, product_id) DO UPDATE SET quantity = excluded.quantity",
        params![user_id, product_id, quantity],
    )?;
    Ok(())
}

/// Applies a relative quantity change to a cart line in one statement,
/// deleting the line when it would drop below one. Rapid concurrent
/// taps cannot lose an update: there is no read-modify-write in Rust.
pub fn adjust_quantity(conn: &Connection, user_id: i64, product_id: &str, delta: i64) -> AppResult<()> {
    let changed = conn.execute(
        "UPDATE cart SET quantity = quantity + ?3
         WHERE user_id = ?1 AND product_id = ?2 AND quantity + ?3 >= 1",
        params![user_id, product_id, delta],
    )?;
    if changed == 0 {
        // Either the line is gone already or the change would hit zero
        conn.execute(
            "DELETE FROM cart WHERE user_id = ?1 AND product_id = ?2",
            params![user_id, product_id],
        )?;
    }
    Ok(())
}

/// Returns the user's cart lines ordered by product title, plus the total.
pub fn view_cart(conn: &Connection, user_id: i64) -> AppResult<CartView> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.title, p.price, c.quantity
         FROM cart c
         JOIN products p ON c.product_id = p.id
         WHERE c.user_id = ?1
         ORDER BY p.title",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(CartLine {
            product_id: row.get(0)?,
            title: row.get(1)?,
            unit_price: row.get(2)?,
            quantity: row.get(3)?,
        })
    })?;

    let mut view = CartView::default();
    for row in rows {
        let line = row?;
        view.total += line.line_total();
        view.lines.push(line);
    }
    Ok(view)
}

/// Removes all cart lines for a user.
pub fn clear_cart(conn: &Connection, user_id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM cart WHERE user_id = ?1", params![user_id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::catalog::{create_category, create_product};
    use crate::storage::db::{ensure_user, init_schema};

    fn test_conn() -> Connection {
        #[allow(clippy::unwrap_used)]
        let conn = Connection::open_in_memory().unwrap();
        #[allow(clippy::unwrap_used)]
        {
            conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
            init_schema(&conn).unwrap();
        }
        ensure_user(&conn, 1, Some("alice")).ok();
        create_category(&conn, "Premium").ok();
        create_product(&conn, "Thai", "", None, 500, "premium").ok();
        create_product(&conn, "Haze", "", None, 300, "premium").ok();
        conn
    }

    #[test]
    fn repeated_add_accumulates_quantity() {
        let conn = test_conn();
        assert_eq!(add_to_cart(&conn, 1, "thai").ok(), Some(1));
        assert_eq!(add_to_cart(&conn, 1, "thai").ok(), Some(2));
    }

    #[test]
    fn adding_missing_product_is_not_found() {
        let conn = test_conn();
        assert!(matches!(
            add_to_cart(&conn, 1, "ghost"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn zero_quantity_removes_the_line() {
        let conn = test_conn();
        add_to_cart(&conn, 1, "thai").ok();
        set_quantity(&conn, 1, "thai", 0).ok();
        assert!(view_cart(&conn, 1).is_ok_and(|v| v.is_empty()));
    }

    #[test]
    fn set_quantity_is_idempotent() {
        let conn = test_conn();
        set_quantity(&conn, 1, "thai", 5).ok();
        set_quantity(&conn, 1, "thai", 5).ok();
        let view = view_cart(&conn, 1).unwrap_or_default();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 5);
        assert_eq!(view.total, 2500);
    }

    #[test]
    fn view_orders_by_title_and_totals_lines() {
        let conn = test_conn();
        add_to_cart(&conn, 1, "thai").ok();
        add_to_cart(&conn, 1, "thai").ok();
        add_to_cart(&conn, 1, "haze").ok();

        let view = view_cart(&conn, 1).unwrap_or_default();
        let titles: Vec<&str> = view.lines.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Haze", "Thai"]);
        assert_eq!(view.total, 300 + 2 * 500);
    }

    #[test]
    fn adjusting_increments_and_decrements_in_place() {
        let conn = test_conn();
        add_to_cart(&conn, 1, "thai").ok();

        adjust_quantity(&conn, 1, "thai", 1).ok();
        adjust_quantity(&conn, 1, "thai", 1).ok();
        let view = view_cart(&conn, 1).unwrap_or_default();
        assert_eq!(view.lines[0].quantity, 3);

        adjust_quantity(&conn, 1, "thai", -1).ok();
        let view = view_cart(&conn, 1).unwrap_or_default();
        assert_eq!(view.lines[0].quantity, 2);
    }

    #[test]
    fn decrementing_to_zero_removes_the_line_and_never_underflows() {
        let conn = test_conn();
        add_to_cart(&conn, 1, "thai").ok();
        add_to_cart(&conn, 1, "thai").ok();

        adjust_quantity(&conn, 1, "thai", -1).ok();
        adjust_quantity(&conn, 1, "thai", -1).ok();
        assert!(view_cart(&conn, 1).is_ok_and(|v| v.is_empty()));

        // A stale tap on an already-removed line is a no-op
        assert!(adjust_quantity(&conn, 1, "thai", -1).is_ok());
        assert!(view_cart(&conn, 1).is_ok_and(|v| v.is_empty()));
    }

    #[test]
    fn deleting_a_product_drops_it_from_carts() {
        let conn = test_conn();
        add_to_cart(&conn, 1, "thai").ok();
        crate::storage::catalog::delete_product(&conn, "thai").ok();
        assert!(view_cart(&conn, 1).is_ok_and(|v| v.is_empty()));
    }
}
