//! Outbound notifications to admins and customers.
//!
//! Every send goes through bounded retry with backoff; a dead chat must
//! not take the handler down, so exhaustion is logged and swallowed.

use teloxide::prelude::*;

use crate::core::retry::{retry_with_backoff, RetryConfig};
use crate::storage::orders::{self, Order};
use crate::storage::questions::Question;
use crate::storage::get_connection;
use crate::telegram::handlers::types::HandlerDeps;
use crate::telegram::texts;

async fn send_with_retry(bot: &Bot, chat_id: ChatId, text: &str, op_name: &str) {
    let config = RetryConfig::new();
    let result = retry_with_backoff(&config, op_name, || bot.send_message(chat_id, text).send()).await;
    if result.is_err() {
        log::error!("{}: could not deliver message to chat {}", op_name, chat_id.0);
    }
}

/// Tells every configured admin about a freshly placed order.
pub async fn notify_admins_new_order(bot: &Bot, deps: &HandlerDeps, order: Order, username: Option<&str>) {
    let items = get_connection(&deps.db_pool)
        .map_err(crate::core::error::AppError::from)
        .and_then(|conn| orders::order_items(&conn, order.id))
        .unwrap_or_else(|err| {
            log::error!("Could not load items for order {} notification: {}", order.id, err);
            Vec::new()
        });

    let text = format!(
        "🔔 New order from user {} (@{})\n\n{}",
        order.user_id,
        username.unwrap_or("-"),
        texts::render_order(&order, &items),
    );

    for admin_id in deps.admin_ids.iter() {
        send_with_retry(bot, ChatId(*admin_id), &text, "notify_admins_new_order").await;
    }
}

/// Tells every configured admin about a new support question.
pub async fn notify_admins_new_question(bot: &Bot, deps: &HandlerDeps, question: &Question) {
    let text = format!(
        "🔔 New question #{} from user {} (@{}):\n\n{}",
        question.id,
        question.user_id,
        question.username.as_deref().unwrap_or("-"),
        question.text,
    );

    for admin_id in deps.admin_ids.iter() {
        send_with_retry(bot, ChatId(*admin_id), &text, "notify_admins_new_question").await;
    }
}

/// Tells the customer their order changed status.
pub async fn notify_status_change(bot: &Bot, order: &Order) {
    let text = format!(
        "📦 Update on your order #{}: {}.",
        order.id,
        texts::status_label(order.status),
    );
    send_with_retry(bot, ChatId(order.user_id), &text, "notify_status_change").await;
}

/// Delivers an admin's answer back to the user who asked.
pub async fn deliver_answer(bot: &Bot, question: &Question, answer_text: &str) {
    let text = format!(
        "💬 Answer to your question:\n\n❓ {}\n\n✅ {}",
        question.text, answer_text,
    );
    send_with_retry(bot, ChatId(question.user_id), &text, "deliver_answer").await;
}
