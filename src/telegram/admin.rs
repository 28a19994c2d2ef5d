//! Admin boards and the catalog editing flows.
//!
//! Every entry point here is reached only after the dispatcher verified
//! the admin role; input steps re-verify in the dialog router.

use teloxide::prelude::*;

use crate::core::error::AppError;
use crate::core::validation::{
    parse_price, slugify, validate_description, validate_image_ref, validate_title,
};
use crate::session::DialogState;
use crate::storage::catalog::{self, ProductField, ProductValue};
use crate::storage::db::{self, Role};
use crate::storage::get_connection;
use crate::telegram::catalog as catalog_ui;
use crate::telegram::handlers::types::{reply_error, HandlerDeps, HandlerError};
use crate::telegram::keyboards;

/// Admin product board: every product as an editable card.
pub async fn show_product_board(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let loaded = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::list_products(&conn, None)
    };

    match loaded {
        Ok(products) => {
            for product in &products {
                catalog_ui::send_product_card(bot, chat_id, product, keyboards::admin_product_card(product)).await?;
            }
            let footer = if products.is_empty() {
                "No products yet."
            } else {
                "🛠 Catalog above."
            };
            bot.send_message(chat_id, footer)
                .reply_markup(keyboards::new_product_button())
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Admin category board.
pub async fn show_category_board(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let loaded = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::list_categories(&conn)
    };

    match loaded {
        Ok(categories) => {
            for category in &categories {
                bot.send_message(chat_id, format!("🗂 {} ({})", category.title, category.id))
                    .reply_markup(keyboards::admin_category_card(category))
                    .await?;
            }
            let footer = if categories.is_empty() {
                "No categories yet."
            } else {
                "🗂 Categories above."
            };
            bot.send_message(chat_id, footer)
                .reply_markup(keyboards::new_category_button())
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// `/setrole <user_id> <role>`: grants or revokes the stored admin role.
pub async fn handle_set_role(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    new_role: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let role = match new_role.to_lowercase().as_str() {
        "admin" => Role::Admin,
        "customer" => Role::Customer,
        other => {
            bot.send_message(chat_id, format!("Unknown role '{}'. Use 'admin' or 'customer'.", other))
                .await?;
            return Ok(());
        }
    };

    // Look the target up first so the reply can name them
    let updated = {
        let conn = get_connection(&deps.db_pool)?;
        db::get_user(&conn, user_id)
            .and_then(|found| found.ok_or_else(|| AppError::NotFound(format!("User {}", user_id))))
            .and_then(|target| db::set_user_role(&conn, user_id, role).map(|()| target))
    };

    match updated {
        Ok(target) => {
            log::info!("AUDIT: chat {} set role of user {} to {}", chat_id.0, user_id, role.as_str());
            bot.send_message(
                chat_id,
                format!(
                    "User {} (@{}) is now a {}.",
                    user_id,
                    target.username.as_deref().unwrap_or("-"),
                    role.as_str()
                ),
            )
            .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// New-category prompt result.
pub async fn handle_category_title_input(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let title = match validate_title(text) {
        Ok(title) => title,
        Err(err) => {
            reply_error(bot, chat_id, &err.into()).await;
            return Ok(());
        }
    };

    let created = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::create_category(&conn, &title)
    };
    deps.sessions.clear_state(chat_id).await;

    match created {
        Ok(category) => {
            bot.send_message(chat_id, format!("✅ Category '{}' created (id: {}).", category.title, category.id))
                .reply_markup(keyboards::remove())
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Category rename prompt result.
pub async fn handle_category_rename_input(
    bot: &Bot,
    chat_id: ChatId,
    category_id: &str,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let title = match validate_title(text) {
        Ok(title) => title,
        Err(err) => {
            reply_error(bot, chat_id, &err.into()).await;
            return Ok(());
        }
    };

    let renamed = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::rename_category(&conn, category_id, &title)
    };
    deps.sessions.clear_state(chat_id).await;

    match renamed {
        Ok(()) => {
            bot.send_message(chat_id, format!("✅ Category renamed to '{}'.", title))
                .reply_markup(keyboards::remove())
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Product wizard step 1: title.
pub async fn handle_product_title_input(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    match validate_title(text) {
        Ok(title) => {
            deps.sessions
                .set_state(chat_id, DialogState::AwaitingProductDescription { title })
                .await;
            bot.send_message(chat_id, "Description:").await?;
        }
        Err(err) => reply_error(bot, chat_id, &err.into()).await,
    }
    Ok(())
}

/// Product wizard step 2: description.
pub async fn handle_product_description_input(
    bot: &Bot,
    chat_id: ChatId,
    title: &str,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    match validate_description(text) {
        Ok(description) => {
            deps.sessions
                .set_state(
                    chat_id,
                    DialogState::AwaitingProductImage {
                        title: title.to_string(),
                        description,
                    },
                )
                .await;
            bot.send_message(chat_id, "Image URL (or '-' for none):").await?;
        }
        Err(err) => reply_error(bot, chat_id, &err.into()).await,
    }
    Ok(())
}

/// Product wizard step 3: image URL or '-'.
pub async fn handle_product_image_input(
    bot: &Bot,
    chat_id: ChatId,
    title: &str,
    description: &str,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    match validate_image_ref(text) {
        Ok(image) => {
            deps.sessions
                .set_state(
                    chat_id,
                    DialogState::AwaitingProductPrice {
                        title: title.to_string(),
                        description: description.to_string(),
                        image,
                    },
                )
                .await;
            bot.send_message(chat_id, "Price (e.g. 99 or 99.50):").await?;
        }
        Err(err) => reply_error(bot, chat_id, &err.into()).await,
    }
    Ok(())
}

/// Product wizard step 4: price.
pub async fn handle_product_price_input(
    bot: &Bot,
    chat_id: ChatId,
    title: &str,
    description: &str,
    image: Option<&str>,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    match parse_price(text) {
        Ok(price) => {
            deps.sessions
                .set_state(
                    chat_id,
                    DialogState::AwaitingProductCategory {
                        title: title.to_string(),
                        description: description.to_string(),
                        image: image.map(str::to_string),
                        price,
                    },
                )
                .await;

            let categories = {
                let conn = get_connection(&deps.db_pool)?;
                catalog::list_categories(&conn).unwrap_or_default()
            };
            let names: Vec<&str> = categories.iter().map(|c| c.title.as_str()).collect();
            bot.send_message(chat_id, format!("Category? Available: {}", names.join(", ")))
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err.into()).await,
    }
    Ok(())
}

/// Product wizard final step: category, then creation.
pub async fn handle_product_category_input(
    bot: &Bot,
    chat_id: ChatId,
    title: &str,
    description: &str,
    image: Option<&str>,
    price: i64,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    // Accept both the display title ("Bulk Deals") and the slug id ("bulk_deals")
    let category_id = slugify(text);

    let created = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::create_product(&conn, title, description, image, price, &category_id)
    };

    match created {
        Ok(product) => {
            deps.sessions.clear_state(chat_id).await;
            bot.send_message(chat_id, format!("✅ Product '{}' created (id: {}).", product.title, product.id))
                .reply_markup(keyboards::remove())
                .await?;
        }
        Err(AppError::NotFound(_)) => {
            // Unknown category: list the options and stay on this step
            let categories = {
                let conn = get_connection(&deps.db_pool)?;
                catalog::list_categories(&conn).unwrap_or_default()
            };
            let names: Vec<&str> = categories.iter().map(|c| c.title.as_str()).collect();
            bot.send_message(
                chat_id,
                format!("No category '{}'. Available: {}", text, names.join(", ")),
            )
            .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Single-field edit: validates per field and applies the update.
pub async fn handle_product_field_input(
    bot: &Bot,
    chat_id: ChatId,
    product_id: &str,
    field: ProductField,
    text: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let value = match field {
        ProductField::Title => validate_title(text).map(ProductValue::Text),
        ProductField::Description => validate_description(text).map(ProductValue::Text),
        ProductField::Image => validate_image_ref(text).map(ProductValue::OptionalText),
        ProductField::Price => parse_price(text).map(ProductValue::Amount),
    };

    let value = match value {
        Ok(value) => value,
        Err(err) => {
            reply_error(bot, chat_id, &err.into()).await;
            return Ok(());
        }
    };

    let updated = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::update_product_field(&conn, product_id, field, &value)
    };
    deps.sessions.clear_state(chat_id).await;

    match updated {
        Ok(()) => {
            bot.send_message(chat_id, format!("✅ {} updated.", field.as_str()))
                .reply_markup(keyboards::remove())
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Deletes a product from an inline button.
pub async fn handle_product_delete(
    bot: &Bot,
    chat_id: ChatId,
    product_id: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let deleted = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::delete_product(&conn, product_id)
    };

    match deleted {
        Ok(()) => {
            bot.send_message(chat_id, format!("🗑 Product '{}' deleted.", product_id))
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Deletes a category from an inline button; rejected while products
/// still reference it.
pub async fn handle_category_delete(
    bot: &Bot,
    chat_id: ChatId,
    category_id: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let deleted = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::delete_category(&conn, category_id)
    };

    match deleted {
        Ok(()) => {
            bot.send_message(chat_id, format!("🗑 Category '{}' deleted.", category_id))
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}
