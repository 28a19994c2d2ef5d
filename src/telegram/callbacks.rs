//! Inline callback routing.
//!
//! Callback data is a colon-separated path: `cat:<id>`, `prod:add:<id>`,
//! `cart:inc|dec|rm:<id>`, and the `adm:` namespace for admin actions.
//! Role is resolved once here; every `adm:` route rejects non-admins.

use teloxide::prelude::*;

use crate::session::DialogState;
use crate::storage::catalog::ProductField;
use crate::storage::cart as cart_storage;
use crate::storage::get_connection;
use crate::storage::orders::OrderStatus;
use crate::telegram::handlers::types::{reply_error, require_admin, HandlerDeps, HandlerError, UserInfo};
use crate::telegram::{admin, cart, catalog, keyboards, orders};

/// Routes one callback query. The query is always answered so the
/// client stops showing a spinner, even when the data is unknown.
pub async fn handle_callback(bot: &Bot, q: CallbackQuery, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(user) = UserInfo::from_callback(&q) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(user.user_id));

    let data = q.data.clone().unwrap_or_default();
    let result = route(bot, &q, chat_id, &user, &data, deps).await;

    bot.answer_callback_query(q.id.clone()).await?;
    result
}

async fn route(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    user: &UserInfo,
    data: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let parts: Vec<&str> = data.split(':').collect();

    match parts.as_slice() {
        ["noop"] => Ok(()),

        ["cat", category_id] => catalog::show_products_in_category(bot, chat_id, category_id, deps).await,

        ["prod", "add", product_id] => {
            let added = {
                let conn = get_connection(&deps.db_pool)?;
                cart_storage::add_to_cart(&conn, user.user_id, product_id)
            };
            match added {
                Ok(quantity) => {
                    bot.send_message(chat_id, format!("🛒 Added to cart (×{}).", quantity))
                        .await?;
                }
                Err(err) => reply_error(bot, chat_id, &err).await,
            }
            Ok(())
        }

        ["cart", op @ ("inc" | "dec" | "rm"), product_id] => {
            let adjusted = match *op {
                "inc" => cart::adjust_quantity(deps, user.user_id, product_id, 1),
                "dec" => cart::adjust_quantity(deps, user.user_id, product_id, -1),
                _ => cart::remove_line(deps, user.user_id, product_id),
            };
            match adjusted {
                Ok(view) => {
                    if let Some(message) = q.message.as_ref() {
                        cart::refresh_cart_message(bot, chat_id, message.id(), &view).await?;
                    }
                }
                Err(err) => reply_error(bot, chat_id, &err).await,
            }
            Ok(())
        }

        ["adm", rest @ ..] => {
            if let Err(err) = require_admin(deps, user, &format!("callback {}", data)) {
                reply_error(bot, chat_id, &err).await;
                return Ok(());
            }
            route_admin(bot, chat_id, rest, deps).await
        }

        _ => {
            log::warn!("Unknown callback data from {}: {:?}", user.user_id, data);
            Ok(())
        }
    }
}

async fn route_admin(bot: &Bot, chat_id: ChatId, parts: &[&str], deps: &HandlerDeps) -> Result<(), HandlerError> {
    match parts {
        ["prod", "new"] => {
            deps.sessions.set_state(chat_id, DialogState::AwaitingProductTitle).await;
            bot.send_message(chat_id, "New product. Title:")
                .reply_markup(keyboards::cancel_only())
                .await?;
            Ok(())
        }
        ["prod", "edit", product_id, field_raw] => {
            let Some(field) = ProductField::parse(field_raw) else {
                log::warn!("Unknown product field in callback: {:?}", field_raw);
                return Ok(());
            };
            deps.sessions
                .set_state(
                    chat_id,
                    DialogState::AwaitingProductField {
                        product_id: product_id.to_string(),
                        field,
                    },
                )
                .await;
            bot.send_message(chat_id, format!("New value for {}:", field.as_str()))
                .reply_markup(keyboards::cancel_only())
                .await?;
            Ok(())
        }
        ["prod", "del", product_id] => admin::handle_product_delete(bot, chat_id, product_id, deps).await,

        ["cat", "new"] => {
            deps.sessions.set_state(chat_id, DialogState::AwaitingCategoryTitle).await;
            bot.send_message(chat_id, "New category. Title:")
                .reply_markup(keyboards::cancel_only())
                .await?;
            Ok(())
        }
        ["cat", "ren", category_id] => {
            deps.sessions
                .set_state(
                    chat_id,
                    DialogState::AwaitingCategoryRename {
                        category_id: category_id.to_string(),
                    },
                )
                .await;
            bot.send_message(chat_id, "New category title:")
                .reply_markup(keyboards::cancel_only())
                .await?;
            Ok(())
        }
        ["cat", "del", category_id] => admin::handle_category_delete(bot, chat_id, category_id, deps).await,

        ["order", op @ ("confirm" | "fulfil" | "cancel"), order_id] => {
            let Ok(order_id) = order_id.parse::<i64>() else {
                return Ok(());
            };
            let new_status = match *op {
                "confirm" => OrderStatus::Confirmed,
                "fulfil" => OrderStatus::Fulfilled,
                _ => OrderStatus::Cancelled,
            };
            orders::apply_status_change(bot, chat_id, order_id, new_status, deps).await
        }

        ["q", "ans", question_id] => {
            let Ok(question_id) = question_id.parse::<i64>() else {
                return Ok(());
            };
            deps.sessions
                .set_state(chat_id, DialogState::AwaitingAnswer { question_id })
                .await;
            bot.send_message(chat_id, format!("Type the answer to question #{}:", question_id))
                .reply_markup(keyboards::cancel_only())
                .await?;
            Ok(())
        }

        _ => {
            log::warn!("Unknown admin callback: {:?}", parts);
            Ok(())
        }
    }
}
