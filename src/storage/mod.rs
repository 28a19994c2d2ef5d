//! Database pool, schema, and the catalog/cart/order/question services

pub mod cart;
pub mod catalog;
pub mod db;
pub mod orders;
pub mod questions;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool, Role, User};
