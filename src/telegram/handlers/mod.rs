//! Dispatcher schema, command handlers, and dialog routing

pub mod commands;
pub mod dialog;
pub mod schema;
pub mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
