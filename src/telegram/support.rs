//! Support questions: customers ask, admins answer.

use teloxide::prelude::*;

use crate::core::config;
use crate::session::DialogState;
use crate::storage::get_connection;
use crate::storage::questions;
use crate::telegram::handlers::types::{reply_error, HandlerDeps, HandlerError, UserInfo};
use crate::telegram::{keyboards, notifications};

/// Starts the ask-a-question flow, unless the user already has the
/// maximum number of unanswered questions.
pub async fn start_question(
    bot: &Bot,
    chat_id: ChatId,
    user: &UserInfo,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    // Keyed by user id, the same key submit enforces the limit on
    let pending = {
        let conn = get_connection(&deps.db_pool)?;
        questions::pending_count(&conn, user.user_id)
    };

    match pending {
        Ok(count) if count >= config::support::MAX_PENDING_QUESTIONS => {
            bot.send_message(
                chat_id,
                format!(
                    "You already have {} unanswered questions. Please wait for a reply before asking more.",
                    count
                ),
            )
            .await?;
        }
        Ok(_) => {
            deps.sessions.set_state(chat_id, DialogState::AwaitingQuestion).await;
            bot.send_message(chat_id, "What would you like to ask? Type your question:")
                .reply_markup(keyboards::cancel_only())
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Admin board: unanswered questions, oldest first.
pub async fn show_pending_questions(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let loaded = {
        let conn = get_connection(&deps.db_pool)?;
        questions::list_pending(&conn)
    };

    match loaded {
        Ok(list) if list.is_empty() => {
            bot.send_message(chat_id, "No unanswered questions. 🎉").await?;
        }
        Ok(list) => {
            for q in &list {
                let text = format!(
                    "❓ Question #{} from {} (@{})\n📅 {}\n\n{}",
                    q.id,
                    q.user_id,
                    q.username.as_deref().unwrap_or("-"),
                    q.created_at.format("%Y-%m-%d %H:%M"),
                    q.text,
                );
                bot.send_message(chat_id, text)
                    .reply_markup(keyboards::admin_question_actions(q.id))
                    .await?;
            }
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Stores the submitted question and alerts the admins.
pub async fn handle_question_input(
    bot: &Bot,
    chat_id: ChatId,
    user: &UserInfo,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let submitted = {
        let mut conn = get_connection(&deps.db_pool)?;
        questions::submit(&mut conn, user.user_id, user.username.as_deref(), text)
    };
    deps.sessions.clear_state(chat_id).await;

    match submitted {
        Ok(question) => {
            bot.send_message(chat_id, "✅ Your question was sent. We will get back to you soon.")
                .reply_markup(keyboards::remove())
                .await?;

            let bot = bot.clone();
            let deps = deps.clone();
            tokio::spawn(async move {
                notifications::notify_admins_new_question(&bot, &deps, &question).await;
            });
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Records an admin's answer and delivers it to the asking user.
pub async fn handle_answer_input(
    bot: &Bot,
    chat_id: ChatId,
    question_id: i64,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let answered = {
        let conn = get_connection(&deps.db_pool)?;
        questions::answer(&conn, question_id, text)
    };
    deps.sessions.clear_state(chat_id).await;

    match answered {
        Ok(question) => {
            bot.send_message(chat_id, format!("✅ Answer to question #{} saved and sent.", question.id))
                .reply_markup(keyboards::remove())
                .await?;
            notifications::deliver_answer(bot, &question, text).await;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}
