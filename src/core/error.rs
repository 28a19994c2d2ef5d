use thiserror::Error;

/// Centralized error types for the application
///
/// Infrastructure failures (database, Telegram API) and expected domain
/// conditions (empty cart, illegal status change) share one enum so every
/// handler can reply, log, and return without crashing the dispatcher.
/// Uses `thiserror` for automatic conversion and display formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// An entity (product, category, order, question) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Role check failed for an admin-only action
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Checkout attempted with no cart lines
    #[error("Cart is empty")]
    EmptyCart,

    /// A user already has the maximum number of pending questions
    #[error("Question limit exceeded ({pending} pending)")]
    QuestionLimitExceeded { pending: usize },

    /// Illegal order-status change
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Malformed user input
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Reply text for errors that are expected, user-recoverable conditions.
    ///
    /// Returns `None` for infrastructure failures; those get a generic
    /// "try again later" reply and a full log line instead of leaking
    /// internals into the chat.
    pub fn user_message(&self) -> Option<String> {
        match self {
            AppError::NotFound(what) => Some(format!("{} — it may have been removed.", what)),
            AppError::Unauthorized(_) => Some("You are not permitted to do that.".to_string()),
            AppError::EmptyCart => Some("Your cart is empty.".to_string()),
            AppError::QuestionLimitExceeded { pending } => Some(format!(
                "You already have {} unanswered questions. Please wait for a reply before asking more.",
                pending
            )),
            AppError::InvalidTransition { from, to } => {
                Some(format!("An order cannot go from '{}' to '{}'.", from, to))
            }
            AppError::Validation(reason) => Some(reason.clone()),
            _ => None,
        }
    }
}
