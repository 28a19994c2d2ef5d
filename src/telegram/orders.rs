//! Order history for customers and the admin order board.

use teloxide::prelude::*;

use crate::storage::get_connection;
use crate::storage::orders::{self, Order, OrderItem};
use crate::telegram::handlers::types::{reply_error, HandlerDeps, HandlerError};
use crate::telegram::{keyboards, notifications, texts};

fn load_with_items(
    conn: &rusqlite::Connection,
    order_list: Vec<Order>,
) -> Result<Vec<(Order, Vec<OrderItem>)>, crate::core::error::AppError> {
    order_list
        .into_iter()
        .map(|order| {
            let items = orders::order_items(conn, order.id)?;
            Ok((order, items))
        })
        .collect()
}

/// Shows the user their own orders, newest first.
pub async fn show_my_orders(
    bot: &Bot,
    chat_id: ChatId,
    user: &crate::telegram::handlers::types::UserInfo,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let loaded = {
        let conn = get_connection(&deps.db_pool)?;
        orders::list_for_user(&conn, user.user_id).and_then(|list| load_with_items(&conn, list))
    };

    match loaded {
        Ok(loaded) if loaded.is_empty() => {
            bot.send_message(chat_id, "You have no orders yet.").await?;
        }
        Ok(loaded) => {
            for (order, items) in &loaded {
                bot.send_message(chat_id, texts::render_order(order, items)).await?;
            }
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Admin board: every order with the legal status transitions inline.
pub async fn show_admin_orders(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let loaded = {
        let conn = get_connection(&deps.db_pool)?;
        orders::list_all(&conn, None).and_then(|list| load_with_items(&conn, list))
    };

    match loaded {
        Ok(loaded) if loaded.is_empty() => {
            bot.send_message(chat_id, "No orders yet.").await?;
        }
        Ok(loaded) => {
            for (order, items) in &loaded {
                let text = format!("👤 User {}\n{}", order.user_id, texts::render_order(order, items));
                bot.send_message(chat_id, text)
                    .reply_markup(keyboards::admin_order_actions(order))
                    .await?;
            }
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Applies a status transition from an admin button and reports the result.
pub async fn apply_status_change(
    bot: &Bot,
    chat_id: ChatId,
    order_id: i64,
    new_status: orders::OrderStatus,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let updated = {
        let conn = get_connection(&deps.db_pool)?;
        orders::update_status(&conn, order_id, new_status)
    };

    match updated {
        Ok(order) => {
            bot.send_message(
                chat_id,
                format!("Order #{} is now {}.", order.id, texts::status_label(order.status)),
            )
            .await?;

            // The customer learns about the change without asking
            notifications::notify_status_change(bot, &order).await;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}
