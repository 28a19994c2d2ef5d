//! Core utilities: configuration, errors, logging, retry, validation

pub mod config;
pub mod error;
pub mod logging;
pub mod retry;
pub mod validation;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use logging::init_logger;
