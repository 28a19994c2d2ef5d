//! Top-level command and reply-keyboard routing.
//!
//! Role is resolved exactly once here and passed down; admin-only
//! routes reject customers with an explicit reply before any service
//! code runs.

use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use super::types::{reply_error, resolve_role, HandlerDeps, HandlerError, UserInfo};
use crate::core::error::AppError;
use crate::storage::db::Role;
use crate::telegram::bot::Command;
use crate::telegram::{admin, cart, catalog, keyboards, orders, support, texts};

/// Sends the role-appropriate main menu.
pub async fn show_main_menu(bot: &Bot, chat_id: ChatId, role: Role) -> Result<(), HandlerError> {
    if role.is_admin() {
        bot.send_message(chat_id, texts::WELCOME_ADMIN)
            .reply_markup(keyboards::admin_menu())
            .await?;
    } else {
        bot.send_message(chat_id, texts::WELCOME)
            .reply_markup(keyboards::customer_menu())
            .await?;
    }
    Ok(())
}

/// Handles `/cancel` and the Cancel button: deterministically returns
/// the user to Idle and discards any partial flow context.
pub async fn handle_cancel(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let was_in_flow = deps.sessions.in_flow(chat_id).await;
    deps.sessions.clear_state(chat_id).await;

    let user = UserInfo::from_message(msg);
    let role = match user {
        Some(ref u) => resolve_role(deps, u).unwrap_or(Role::Customer),
        None => Role::Customer,
    };

    let text = if was_in_flow { texts::CANCELLED } else { texts::NOTHING_TO_CANCEL };
    let markup = if role.is_admin() {
        keyboards::admin_menu()
    } else {
        keyboards::customer_menu()
    };
    bot.send_message(chat_id, text).reply_markup(markup).await?;
    Ok(())
}

/// Handles slash commands (outside of an active flow).
pub async fn handle_command(bot: &Bot, msg: &Message, cmd: Command, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let Some(user) = UserInfo::from_message(msg) else {
        return Ok(());
    };
    let role = match resolve_role(deps, &user) {
        Ok(role) => role,
        Err(err) => {
            reply_error(bot, chat_id, &err).await;
            return Ok(());
        }
    };

    let result = match cmd {
        Command::Start => show_main_menu(bot, chat_id, role).await,
        Command::Help => {
            bot.send_message(chat_id, Command::descriptions().to_string()).await?;
            Ok(())
        }
        // Reached only when idle; an active flow is cancelled earlier in the chain
        Command::Cancel => {
            bot.send_message(chat_id, texts::NOTHING_TO_CANCEL).await?;
            Ok(())
        }
        Command::Catalog => catalog::show_categories(bot, chat_id, deps).await,
        Command::Cart => cart::show_cart(bot, chat_id, &user, deps).await,
        Command::Orders => orders::show_my_orders(bot, chat_id, &user, deps).await,
        Command::Contact => support::start_question(bot, chat_id, &user, deps).await,
        Command::Admin => {
            if role.is_admin() {
                show_main_menu(bot, chat_id, role).await
            } else {
                reply_error(bot, chat_id, &AppError::Unauthorized("/admin".to_string())).await;
                Ok(())
            }
        }
        Command::SetRole { user_id, role: new_role } => {
            if role.is_admin() {
                admin::handle_set_role(bot, chat_id, user_id, &new_role, deps).await
            } else {
                reply_error(bot, chat_id, &AppError::Unauthorized("/setrole".to_string())).await;
                Ok(())
            }
        }
    };

    result
}

/// Handles reply-keyboard buttons and free text (outside of a flow).
pub async fn handle_text(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(user) = UserInfo::from_message(msg) else {
        return Ok(());
    };
    let role = match resolve_role(deps, &user) {
        Ok(role) => role,
        Err(err) => {
            reply_error(bot, chat_id, &err).await;
            return Ok(());
        }
    };

    match text {
        texts::BTN_CATALOG => catalog::show_categories(bot, chat_id, deps).await,
        texts::BTN_CART => cart::show_cart(bot, chat_id, &user, deps).await,
        texts::BTN_DELIVERY_STATUS => orders::show_my_orders(bot, chat_id, &user, deps).await,
        texts::BTN_CONTACT => support::start_question(bot, chat_id, &user, deps).await,
        texts::BTN_CHECKOUT => cart::start_checkout(bot, chat_id, &user, deps).await,
        texts::BTN_BACK_TO_MENU => show_main_menu(bot, chat_id, role).await,
        texts::BTN_ADMIN_CATALOG if role.is_admin() => admin::show_product_board(bot, chat_id, deps).await,
        texts::BTN_ADMIN_CATEGORIES if role.is_admin() => admin::show_category_board(bot, chat_id, deps).await,
        texts::BTN_ADMIN_ORDERS if role.is_admin() => orders::show_admin_orders(bot, chat_id, deps).await,
        texts::BTN_ADMIN_QUESTIONS if role.is_admin() => support::show_pending_questions(bot, chat_id, deps).await,
        texts::BTN_ADMIN_CATALOG | texts::BTN_ADMIN_CATEGORIES | texts::BTN_ADMIN_ORDERS
        | texts::BTN_ADMIN_QUESTIONS => {
            reply_error(bot, chat_id, &AppError::Unauthorized(format!("button {:?}", text))).await;
            Ok(())
        }
        _ => {
            bot.send_message(chat_id, texts::UNKNOWN_INPUT).await?;
            Ok(())
        }
    }
}
