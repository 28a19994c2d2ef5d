use anyhow::Result;
use dotenvy::dotenv;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::sleep;

use verdura::cli::{Cli, Commands};
use verdura::core::{config, init_logger};
use verdura::session::SessionTracker;
use verdura::storage::db::{init_schema, seed_demo_data};
use verdura::storage::{create_pool, get_connection};
use verdura::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot.
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Catch panics in the dispatcher so they are logged and the bot can
    // be restarted instead of silently terminating
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    init_logger(&config::LOG_FILE_PATH)?;

    let _ = dotenv();

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::InitDb { seed }) => run_init_db(seed),
    }
}

/// Creates the schema (and optionally the demo catalog) without starting the bot.
fn run_init_db(seed: bool) -> Result<()> {
    let db_pool =
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    let conn = get_connection(&db_pool)?;
    init_schema(&conn)?;
    log::info!("Schema ready at {}", *config::DATABASE_PATH);

    if seed {
        seed_demo_data(&conn)?;
        log::info!("Demo catalog seeded");
    }
    Ok(())
}

/// Runs the Telegram bot with long polling.
async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");

    let bot = create_bot()?;

    // Get bot information; retry while the Bot API is still initializing
    let bot_info = {
        let startup_max_retries = 60;
        let mut startup_retry = 0;
        loop {
            match bot.get_me().await {
                Ok(info) => break info,
                Err(e) => {
                    let err_str = e.to_string();
                    let is_retryable = err_str.contains("restart")
                        || err_str.contains("network")
                        || err_str.contains("connection")
                        || err_str.contains("timed out")
                        || err_str.contains("Connection refused");

                    startup_retry += 1;
                    if startup_retry >= startup_max_retries || !is_retryable {
                        return Err(anyhow::anyhow!(
                            "Failed to connect to Bot API after {} retries: {}",
                            startup_retry,
                            e
                        ));
                    }

                    log::warn!(
                        "Bot API not ready (attempt {}/{}): {}. Retrying in 5 seconds...",
                        startup_retry,
                        startup_max_retries,
                        err_str
                    );
                    sleep(Duration::from_secs(5)).await;
                }
            }
        }
    };
    log::info!("Bot username: {:?}, Bot ID: {}", bot_info.username.as_deref(), bot_info.id);

    setup_bot_commands(&bot).await?;

    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );

    let admin_ids: Arc<HashSet<i64>> = Arc::new(config::ADMINS.clone());
    if admin_ids.is_empty() {
        log::warn!("ADMINS is empty; only stored-role admins can use the admin tools");
    } else {
        log::info!("{} admin id(s) configured", admin_ids.len());
    }

    let sessions = Arc::new(SessionTracker::new());

    let handler_deps = HandlerDeps::new(Arc::clone(&db_pool), Arc::clone(&sessions), admin_ids);
    let handler = schema(handler_deps);

    log::info!("Starting bot in long polling mode");

    let mut retry_count = 0;
    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;

    // Run the dispatcher in a task so a panic inside it can be caught
    // via the JoinHandle and answered with a reconnect
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    log::error!("Dispatcher panicked: {}", join_err);

                    if retry_count < max_retries {
                        retry_count += 1;
                        log::info!(
                            "Retrying dispatcher connection after panic (attempt {}/{})...",
                            retry_count,
                            max_retries
                        );
                    } else {
                        log::error!("Max retries reached after panic. Exiting...");
                        break;
                    }
                } else {
                    log::warn!("Dispatcher task was cancelled: {}", join_err);
                    break;
                }
            }
        }

        if retry_count > 0 {
            sleep(Duration::from_secs(config::retry::DISPATCHER_RETRY_DELAY_SECS)).await;
        }
    }

    Ok(())
}
