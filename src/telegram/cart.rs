//! Cart view and the checkout flow (address -> phone -> order).

use teloxide::prelude::*;

use crate::core::error::AppError;
use crate::core::validation::{validate_address, validate_phone};
use crate::session::DialogState;
use crate::storage::cart::{self, CartView};
use crate::storage::get_connection;
use crate::storage::orders;
use crate::telegram::handlers::commands::show_main_menu;
use crate::telegram::handlers::types::{reply_error, resolve_role, HandlerDeps, HandlerError, UserInfo};
use crate::telegram::{keyboards, notifications, texts};

/// Shows the user's cart with per-line quantity controls.
pub async fn show_cart(bot: &Bot, chat_id: ChatId, user: &UserInfo, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let view = {
        let conn = get_connection(&deps.db_pool)?;
        cart::view_cart(&conn, user.user_id)
    };

    match view {
        Ok(view) if view.is_empty() => {
            bot.send_message(chat_id, "Your cart is empty.").await?;
        }
        Ok(view) => {
            bot.send_message(chat_id, texts::render_cart(&view))
                .reply_markup(keyboards::cart_controls(&view))
                .await?;
            bot.send_message(chat_id, "Ready to order?")
                .reply_markup(keyboards::cart_actions())
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Begins the checkout flow: verifies the cart and asks for an address.
pub async fn start_checkout(
    bot: &Bot,
    chat_id: ChatId,
    user: &UserInfo,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let view = {
        let conn = get_connection(&deps.db_pool)?;
        cart::view_cart(&conn, user.user_id)
    };

    match view {
        Ok(view) if view.is_empty() => {
            reply_error(bot, chat_id, &AppError::EmptyCart).await;
        }
        Ok(_) => {
            deps.sessions.set_state(chat_id, DialogState::AwaitingShippingAddress).await;
            bot.send_message(chat_id, "Please enter your shipping address:")
                .reply_markup(keyboards::cancel_only())
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Checkout step 1: shipping address.
pub async fn handle_address_input(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    match validate_address(text) {
        Ok(address) => {
            deps.sessions.set_state(chat_id, DialogState::AwaitingPhone { address }).await;
            bot.send_message(chat_id, "Got it. Now a contact phone number:")
                .reply_markup(keyboards::cancel_only())
                .await?;
        }
        Err(err) => {
            // Re-prompt, state stays on the address step
            reply_error(bot, chat_id, &err.into()).await;
        }
    }
    Ok(())
}

/// Checkout step 2: phone, then the atomic cart-to-order conversion.
pub async fn handle_phone_input(
    bot: &Bot,
    chat_id: ChatId,
    user: &UserInfo,
    address: &str,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let phone = match validate_phone(text) {
        Ok(phone) => phone,
        Err(err) => {
            reply_error(bot, chat_id, &err.into()).await;
            return Ok(());
        }
    };

    let placed = {
        let mut conn = get_connection(&deps.db_pool)?;
        orders::checkout(&mut conn, user.user_id, address, &phone)
    };
    deps.sessions.clear_state(chat_id).await;

    match placed {
        Ok(order) => {
            bot.send_message(chat_id, texts::order_placed(&order))
                .reply_markup(keyboards::remove())
                .await?;

            let role = resolve_role(deps, user).unwrap_or(crate::storage::db::Role::Customer);
            show_main_menu(bot, chat_id, role).await?;

            // Admin alert happens off the hot path
            let bot = bot.clone();
            let deps = deps.clone();
            let username = user.username.clone();
            tokio::spawn(async move {
                notifications::notify_admins_new_order(&bot, &deps, order, username.as_deref()).await;
            });
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Adjusts a cart line from the inline controls; returns the refreshed
/// view so the caller can re-render.
pub fn adjust_quantity(deps: &HandlerDeps, user_id: i64, product_id: &str, delta: i64) -> Result<CartView, AppError> {
    let conn = get_connection(&deps.db_pool)?;
    cart::adjust_quantity(&conn, user_id, product_id, delta)?;
    cart::view_cart(&conn, user_id)
}

/// Removes a cart line from the 🗑 button.
pub fn remove_line(deps: &HandlerDeps, user_id: i64, product_id: &str) -> Result<CartView, AppError> {
    let conn = get_connection(&deps.db_pool)?;
    cart::set_quantity(&conn, user_id, product_id, 0)?;
    cart::view_cart(&conn, user_id)
}

/// Re-renders the cart message after an inline adjustment.
pub async fn refresh_cart_message(
    bot: &Bot,
    chat_id: ChatId,
    message_id: teloxide::types::MessageId,
    view: &CartView,
) -> Result<(), HandlerError> {
    if view.is_empty() {
        bot.edit_message_text(chat_id, message_id, "Your cart is empty.").await?;
    } else {
        bot.edit_message_text(chat_id, message_id, texts::render_cart(view))
            .reply_markup(keyboards::cart_controls(view))
            .await?;
    }
    Ok(())
}
