//! Bot initialization and command definitions

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "What I can do:")]
pub enum Command {
    #[command(description = "show the main menu")]
    Start,
    #[command(description = "list available commands")]
    Help,
    #[command(description = "cancel the current operation")]
    Cancel,
    #[command(description = "browse the catalog")]
    Catalog,
    #[command(description = "show your cart")]
    Cart,
    #[command(description = "show your orders")]
    Orders,
    #[command(description = "ask our team a question")]
    Contact,
    #[command(description = "open the admin panel (admins only)")]
    Admin,
    #[command(description = "grant or revoke the admin role (admins only)", parse_with = "split")]
    SetRole { user_id: i64, role: String },
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to create bot (invalid URL, network issues, etc.)
pub fn create_bot() -> anyhow::Result<Bot> {
    // Check if local Bot API server is configured
    let bot = if let Ok(bot_api_url) = std::env::var("BOT_API_URL") {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(&bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
        Bot::from_env_with_client(ClientBuilder::new().timeout(config::network::timeout()).build()?).set_api_url(url)
    } else {
        Bot::from_env_with_client(ClientBuilder::new().timeout(config::network::timeout()).build()?)
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
///
/// Admin-only commands are deliberately left out of the visible list;
/// they still dispatch when typed.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![
        BotCommand::new("start", "show the main menu"),
        BotCommand::new("help", "list available commands"),
        BotCommand::new("cancel", "cancel the current operation"),
        BotCommand::new("catalog", "browse the catalog"),
        BotCommand::new("cart", "show your cart"),
        BotCommand::new("orders", "show your orders"),
        BotCommand::new("contact", "ask our team a question"),
    ])
    .await?;

    Ok(())
}
