//! Connection pool, schema initialization, and user records.
//!
//! All services issue SQL through a pooled `rusqlite` connection. The
//! schema is created idempotently on pool startup; `init-db --seed` adds
//! the demo catalog.

use chrono::NaiveDateTime;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};

use crate::core::error::{AppError, AppResult};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Role classification determining which operations a user may invoke.
///
/// Resolved once per incoming update at the dispatcher boundary and
/// passed into handlers; services document their admin-only
/// preconditions instead of re-checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    /// Unknown values degrade to `Customer`; granting admin by typo is
    /// the failure mode to avoid.
    pub fn parse(value: &str) -> Role {
        match value {
            "admin" => Role::Admin,
            _ => Role::Customer,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

/// A user row: created on first interaction, never deleted.
#[derive(Debug, Clone)]
pub struct User {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub role: Role,
    pub created_at: NaiveDateTime,
}

/// Create a new database connection pool
///
/// Initializes a pool with up to 10 connections, enables foreign keys on
/// every connection, and creates the schema if it does not exist yet.
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    // busy_timeout makes concurrent immediate transactions queue
    // instead of failing with SQLITE_BUSY
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;"));
    let pool = Pool::builder().max_size(10).build(manager)?;

    let conn = pool.get()?;
    if let Err(e) = init_schema(&conn) {
        log::error!("Failed to initialize schema: {}", e);
    }

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Creates all tables if they do not exist.
///
/// `order_items.product_id` intentionally carries no foreign key: order
/// items are a snapshot and must survive later product deletion. Cart
/// lines do reference products and are cascade-deleted with them.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id INTEGER PRIMARY KEY,
            username TEXT,
            role TEXT NOT NULL DEFAULT 'customer',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            image TEXT,
            price INTEGER NOT NULL,
            category_id TEXT REFERENCES categories(id),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS cart (
            user_id INTEGER NOT NULL REFERENCES users(telegram_id),
            product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity >= 1),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (user_id, product_id)
        );

        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(telegram_id),
            status TEXT NOT NULL DEFAULT 'pending',
            address TEXT NOT NULL,
            phone TEXT NOT NULL,
            total INTEGER NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS order_items (
            order_id INTEGER NOT NULL REFERENCES orders(id),
            product_id TEXT NOT NULL,
            title TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            unit_price INTEGER NOT NULL,
            PRIMARY KEY (order_id, product_id)
        );

        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(telegram_id),
            username TEXT,
            text TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            answer TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_id);
        CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id);
        CREATE INDEX IF NOT EXISTS idx_questions_pending ON questions(user_id, status);",
    )
}

/// Seeds the demo categories and products. Idempotent.
pub fn seed_demo_data(conn: &Connection) -> rusqlite::Result<()> {
    let categories = [
        ("premium", "🔥 Premium Strains"),
        ("hybrid", "🌿 Hybrid Strains"),
        ("bulk", "📦 Bulk Deals"),
    ];
    for (id, title) in categories {
        conn.execute(
            "INSERT OR IGNORE INTO categories (id, title) VALUES (?1, ?2)",
            params![id, title],
        )?;
    }

    let products = [
        (
            "thai_premium",
            "Premium Thai",
            "Our signature Thai strain, carefully cultivated for maximum potency and flavor.\n\n• Effects: Energetic, Creative, Focused\n• Type: Sativa-dominant\n• Cultivation: Indoor",
            Some("https://i.ibb.co/VqFgzVk/product1-1.jpg"),
            99000i64,
            "premium",
        ),
        (
            "island_blend",
            "Island Blend",
            "A unique blend of island-grown strains, offering a perfect balance of effects.\n\n• Effects: Balanced, Smooth, Versatile\n• Type: Hybrid\n• Cultivation: Indoor/Outdoor",
            Some("https://i.ibb.co/0MdRHKd/product2-1.jpg"),
            99000,
            "hybrid",
        ),
        (
            "royal_haze",
            "Royal Haze",
            "Our premium haze variety, known for its exceptional quality and consistent effects.\n\n• Effects: Uplifting, Clear, Long-lasting\n• Type: Sativa\n• Cultivation: Indoor",
            Some("https://i.ibb.co/C2Lx9Lq/product3-1.jpg"),
            99000,
            "bulk",
        ),
    ];
    for (id, title, description, image, price, category) in products {
        conn.execute(
            "INSERT OR IGNORE INTO products (id, title, description, image, price, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, title, description, image, price, category],
        )?;
    }

    Ok(())
}

/// Ensures a user row exists, creating it on first interaction.
///
/// Returns `true` if the user was newly created. The stored username is
/// refreshed when Telegram reports a different one.
pub fn ensure_user(conn: &Connection, telegram_id: i64, username: Option<&str>) -> AppResult<bool> {
    let created = conn.execute(
        "INSERT OR IGNORE INTO users (telegram_id, username) VALUES (?1, ?2)",
        params![telegram_id, username],
    )? == 1;

    if !created {
        conn.execute(
            "UPDATE users SET username = ?1 WHERE telegram_id = ?2 AND username IS NOT ?1",
            params![username, telegram_id],
        )?;
    }

    Ok(created)
}

/// Fetches a user by Telegram id.
pub fn get_user(conn: &Connection, telegram_id: i64) -> AppResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT telegram_id, username, role, created_at FROM users WHERE telegram_id = ?1",
            params![telegram_id],
            |row| {
                Ok(User {
                    telegram_id: row.get(0)?,
                    username: row.get(1)?,
                    role: Role::parse(&row.get::<_, String>(2)?),
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

/// Returns the stored role of a user; unknown users are customers.
pub fn stored_role(conn: &Connection, telegram_id: i64) -> AppResult<Role> {
    let role: Option<String> = conn
        .query_row(
            "SELECT role FROM users WHERE telegram_id = ?1",
            params![telegram_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(role.as_deref().map(Role::parse).unwrap_or(Role::Customer))
}

/// Sets the stored role of a user. Precondition: caller is an admin.
pub fn set_user_role(conn: &Connection, telegram_id: i64, role: Role) -> AppResult<()> {
    let changed = conn.execute(
        "UPDATE users SET role = ?1 WHERE telegram_id = ?2",
        params![role.as_str(), telegram_id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("User {}", telegram_id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        #[allow(clippy::unwrap_used)]
        let conn = Connection::open_in_memory().unwrap();
        #[allow(clippy::unwrap_used)]
        {
            conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
            init_schema(&conn).unwrap();
        }
        conn
    }

    #[test]
    fn ensure_user_is_idempotent() {
        let conn = test_conn();
        assert!(ensure_user(&conn, 42, Some("alice")).is_ok_and(|created| created));
        assert!(ensure_user(&conn, 42, Some("alice")).is_ok_and(|created| !created));
    }

    #[test]
    fn ensure_user_refreshes_username() {
        let conn = test_conn();
        ensure_user(&conn, 42, Some("old_name")).ok();
        ensure_user(&conn, 42, Some("new_name")).ok();
        let user = get_user(&conn, 42).ok().flatten().map(|u| u.username);
        assert_eq!(user, Some(Some("new_name".to_string())));
    }

    #[test]
    fn roles_default_to_customer_and_can_be_promoted() {
        let conn = test_conn();
        ensure_user(&conn, 7, None).ok();
        assert_eq!(stored_role(&conn, 7).ok(), Some(Role::Customer));
        assert!(set_user_role(&conn, 7, Role::Admin).is_ok());
        assert_eq!(stored_role(&conn, 7).ok(), Some(Role::Admin));
        // Unknown users are plain customers
        assert_eq!(stored_role(&conn, 9999).ok(), Some(Role::Customer));
    }

    #[test]
    fn promoting_missing_user_is_not_found() {
        let conn = test_conn();
        assert!(matches!(
            set_user_role(&conn, 1, Role::Admin),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn seed_is_idempotent() {
        let conn = test_conn();
        #[allow(clippy::unwrap_used)]
        {
            seed_demo_data(&conn).unwrap();
            seed_demo_data(&conn).unwrap();
        }
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))
            .unwrap_or(0);
        assert_eq!(count, 3);
    }
}
