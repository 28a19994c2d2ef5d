//! Customer-facing catalog browsing.

use teloxide::prelude::*;
use teloxide::types::InputFile;

use crate::storage::catalog::{self, Product};
use crate::storage::get_connection;
use crate::telegram::handlers::types::{reply_error, HandlerDeps, HandlerError};
use crate::telegram::{keyboards, texts};

/// Shows the category picker.
pub async fn show_categories(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let categories = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::list_categories(&conn)
    };

    match categories {
        Ok(categories) if categories.is_empty() => {
            bot.send_message(chat_id, "The catalog is empty right now — check back soon!")
                .await?;
        }
        Ok(categories) => {
            bot.send_message(chat_id, "🛍 Pick a category:")
                .reply_markup(keyboards::category_list(&categories))
                .await?;
        }
        Err(err) => reply_error(bot, chat_id, &err).await,
    }
    Ok(())
}

/// Shows every product of one category as a card with an add button.
pub async fn show_products_in_category(
    bot: &Bot,
    chat_id: ChatId,
    category_id: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let loaded = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::get_category(&conn, category_id).and_then(|category| {
            catalog::list_products(&conn, Some(category_id)).map(|products| (category, products))
        })
    };

    let (category, products) = match loaded {
        Ok(pair) => pair,
        Err(err) => {
            reply_error(bot, chat_id, &err).await;
            return Ok(());
        }
    };

    if products.is_empty() {
        bot.send_message(chat_id, format!("No products in {} yet.", category.title))
            .await?;
        return Ok(());
    }

    for product in &products {
        send_product_card(bot, chat_id, product, keyboards::product_card(product)).await?;
    }
    Ok(())
}

/// Renders one product as a photo+caption card when it has an image,
/// plain text otherwise.
pub async fn send_product_card(
    bot: &Bot,
    chat_id: ChatId,
    product: &Product,
    markup: teloxide::types::InlineKeyboardMarkup,
) -> Result<(), HandlerError> {
    let text = format!(
        "🏷 {}\n💰 Price: {}\n\n{}",
        product.title,
        texts::format_price(product.price),
        product.description,
    );

    let photo_url = product.image.as_deref().and_then(|image| url::Url::parse(image).ok());
    match photo_url {
        Some(photo) => {
            // A dead image link must not hide the product
            let sent = bot
                .send_photo(chat_id, InputFile::url(photo))
                .caption(text.clone())
                .reply_markup(markup.clone())
                .await;
            if let Err(err) = sent {
                log::warn!("Falling back to text card for product {}: {}", product.id, err);
                bot.send_message(chat_id, text).reply_markup(markup).await?;
            }
        }
        None => {
            bot.send_message(chat_id, text).reply_markup(markup).await?;
        }
    }
    Ok(())
}
