//! Handler types, dependencies, and role resolution

use std::collections::HashSet;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::Message;

use crate::core::error::AppError;
use crate::session::SessionTracker;
use crate::storage::db::{self, DbPool, Role};
use crate::storage::get_connection;
use crate::telegram::texts;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub sessions: Arc<SessionTracker>,
    /// Externally supplied admin ids (from configuration), consulted in
    /// addition to the stored role column.
    pub admin_ids: Arc<HashSet<i64>>,
}

impl HandlerDeps {
    pub fn new(db_pool: Arc<DbPool>, sessions: Arc<SessionTracker>, admin_ids: Arc<HashSet<i64>>) -> Self {
        Self {
            db_pool,
            sessions,
            admin_ids,
        }
    }
}

/// User info extracted from an incoming update.
#[derive(Clone)]
pub struct UserInfo {
    pub user_id: i64,
    pub username: Option<String>,
}

impl UserInfo {
    pub fn from_message(msg: &Message) -> Option<Self> {
        let from = msg.from.as_ref()?;
        Some(Self {
            user_id: i64::try_from(from.id.0).ok()?,
            username: from.username.clone(),
        })
    }

    pub fn from_callback(q: &CallbackQuery) -> Option<Self> {
        Some(Self {
            user_id: i64::try_from(q.from.id.0).ok()?,
            username: q.from.username.clone(),
        })
    }
}

/// Resolves the acting user's role: the single capability check,
/// performed once per update at the dispatcher boundary.
///
/// A user is an admin when listed in the configured admin ids or when
/// their stored role is `admin`. The user row is created on first
/// interaction as a side effect.
pub fn resolve_role(deps: &HandlerDeps, user: &UserInfo) -> Result<Role, AppError> {
    let conn = get_connection(&deps.db_pool)?;
    let created = db::ensure_user(&conn, user.user_id, user.username.as_deref())?;
    if created {
        log::info!(
            "New user {} (@{})",
            user.user_id,
            user.username.as_deref().unwrap_or("-")
        );
    }

    if deps.admin_ids.contains(&user.user_id) {
        return Ok(Role::Admin);
    }
    db::stored_role(&conn, user.user_id)
}

/// The admin gate: resolves the role and rejects customers before any
/// admin action runs. `action` names the attempt for the audit log.
pub fn require_admin(deps: &HandlerDeps, user: &UserInfo, action: &str) -> Result<Role, AppError> {
    let role = resolve_role(deps, user)?;
    if !role.is_admin() {
        return Err(AppError::Unauthorized(action.to_string()));
    }
    Ok(role)
}

/// Replies to a failed operation without crashing the dispatcher.
///
/// Expected domain conditions get their specific message; infrastructure
/// failures are logged in full and answered with a generic retry hint.
/// Unauthorized attempts additionally leave an audit log line.
pub async fn reply_error(bot: &Bot, chat_id: ChatId, err: &AppError) {
    if let AppError::Unauthorized(action) = err {
        log::warn!("AUDIT: user {} denied admin action: {}", chat_id.0, action);
    }

    let text = match err.user_message() {
        Some(text) => text,
        None => {
            log::error!("Internal error while handling chat {}: {}", chat_id.0, err);
            texts::TRY_AGAIN_LATER.to_string()
        }
    };

    if let Err(send_err) = bot.send_message(chat_id, text).await {
        log::error!("Failed to send error reply to {}: {}", chat_id.0, send_err);
    }
}
