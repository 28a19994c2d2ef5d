//! Routes messages from users who are mid-flow to the right input step.
//!
//! Each step validates its input; on failure the user is re-prompted
//! and the state does not advance. Admin flows re-verify the role so a
//! demotion mid-flow cannot finish a wizard.

use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{reply_error, resolve_role, HandlerDeps, HandlerError, UserInfo};
use crate::core::error::AppError;
use crate::session::DialogState;
use crate::telegram::{admin, cart, support, texts};

/// Dispatches a message to the handler of the user's current step.
pub async fn handle_dialog_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(user) = UserInfo::from_message(msg) else {
        return Ok(());
    };

    let state = deps.sessions.get_state(chat_id).await;

    // Admin wizards must not survive a demotion mid-flow
    if is_admin_flow(&state) {
        let role = resolve_role(deps, &user).unwrap_or(crate::storage::db::Role::Customer);
        if !role.is_admin() {
            deps.sessions.clear_state(chat_id).await;
            reply_error(bot, chat_id, &AppError::Unauthorized("admin flow input".to_string())).await;
            return Ok(());
        }
    }

    match state {
        // Checkout
        DialogState::AwaitingShippingAddress => cart::handle_address_input(bot, chat_id, text, deps).await,
        DialogState::AwaitingPhone { address } => {
            cart::handle_phone_input(bot, chat_id, &user, &address, text, deps).await
        }

        // Support
        DialogState::AwaitingQuestion => support::handle_question_input(bot, chat_id, &user, text, deps).await,
        DialogState::AwaitingAnswer { question_id } => {
            support::handle_answer_input(bot, chat_id, question_id, text, deps).await
        }

        // Admin: categories
        DialogState::AwaitingCategoryTitle => admin::handle_category_title_input(bot, chat_id, text, deps).await,
        DialogState::AwaitingCategoryRename { category_id } => {
            admin::handle_category_rename_input(bot, chat_id, &category_id, text, deps).await
        }

        // Admin: product wizard
        DialogState::AwaitingProductTitle => admin::handle_product_title_input(bot, chat_id, text, deps).await,
        DialogState::AwaitingProductDescription { title } => {
            admin::handle_product_description_input(bot, chat_id, &title, text, deps).await
        }
        DialogState::AwaitingProductImage { title, description } => {
            admin::handle_product_image_input(bot, chat_id, &title, &description, text, deps).await
        }
        DialogState::AwaitingProductPrice {
            title,
            description,
            image,
        } => admin::handle_product_price_input(bot, chat_id, &title, &description, image.as_deref(), text, deps).await,
        DialogState::AwaitingProductCategory {
            title,
            description,
            image,
            price,
        } => {
            admin::handle_product_category_input(
                bot,
                chat_id,
                &title,
                &description,
                image.as_deref(),
                price,
                text,
                deps,
            )
            .await
        }

        // Admin: single-field edit
        DialogState::AwaitingProductField { product_id, field } => {
            admin::handle_product_field_input(bot, chat_id, &product_id, field, text, deps).await
        }

        // Race: state cleared between filter and endpoint (e.g. restart)
        DialogState::Idle => {
            bot.send_message(chat_id, texts::SESSION_EXPIRED).await?;
            Ok(())
        }
    }
}

fn is_admin_flow(state: &DialogState) -> bool {
    matches!(
        state,
        DialogState::AwaitingAnswer { .. }
            | DialogState::AwaitingCategoryTitle
            | DialogState::AwaitingCategoryRename { .. }
            | DialogState::AwaitingProductTitle
            | DialogState::AwaitingProductDescription { .. }
            | DialogState::AwaitingProductImage { .. }
            | DialogState::AwaitingProductPrice { .. }
            | DialogState::AwaitingProductCategory { .. }
            | DialogState::AwaitingProductField { .. }
    )
}
