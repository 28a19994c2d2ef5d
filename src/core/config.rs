use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot

/// Path to the SQLite database file
/// Read from DATABASE_PATH environment variable, defaults to "verdura.sqlite"
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "verdura.sqlite".to_string()));

/// Path to the log file
/// Read from LOG_FILE_PATH environment variable, defaults to "verdura.log"
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "verdura.log".to_string()));

/// Telegram user ids treated as admins regardless of their stored role.
///
/// Read from the ADMINS environment variable as a comma-separated list,
/// e.g. `ADMINS=123456789,987654321`. Entries that fail to parse are
/// skipped with a warning.
pub static ADMINS: Lazy<HashSet<i64>> = Lazy::new(|| {
    let raw = env::var("ADMINS").unwrap_or_default();
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                log::warn!("Ignoring unparseable admin id in ADMINS: {:?}", s);
                None
            }
        })
        .collect()
});

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Telegram API requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Retry configuration
pub mod retry {
    /// Maximum number of retry attempts for outbound notifications
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Maximum number of retries for dispatcher reconnection
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Delay between dispatcher retry attempts (in seconds)
    pub const DISPATCHER_RETRY_DELAY_SECS: u64 = 5;
}

/// Support question configuration
pub mod support {
    /// Maximum simultaneously pending questions per user
    pub const MAX_PENDING_QUESTIONS: usize = 3;
}

/// Catalog input limits
pub mod catalog {
    /// Maximum product/category title length
    pub const MAX_TITLE_LEN: usize = 120;

    /// Maximum product description length
    pub const MAX_DESCRIPTION_LEN: usize = 2000;
}

/// Checkout input limits
pub mod checkout {
    /// Maximum shipping address length
    pub const MAX_ADDRESS_LEN: usize = 500;
}
