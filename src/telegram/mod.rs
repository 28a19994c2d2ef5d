//! Telegram bot: dispatcher schema, handlers, keyboards, and texts.

pub mod admin;
pub mod bot;
pub mod callbacks;
pub mod cart;
pub mod catalog;
pub mod handlers;
pub mod keyboards;
pub mod notifications;
pub mod orders;
pub mod support;
pub mod texts;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
