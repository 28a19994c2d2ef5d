//! Verdura - Telegram ordering bot for a wholesale catalog
//!
//! This library provides all the core functionality for the Verdura bot:
//! catalog and cart management, transactional checkout, order tracking,
//! support questions, and Telegram bot integration.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, retry, and input validation
//! - `storage`: Database pool, schema, and the catalog/cart/order/question services
//! - `session`: In-memory per-user dialog state tracking
//! - `telegram`: Telegram bot integration and handlers

pub mod cli;
pub mod core;
pub mod session;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use session::{DialogState, SessionTracker};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
