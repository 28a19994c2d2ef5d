//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::{handle_cancel, handle_command, handle_text};
use super::dialog::handle_dialog_message;
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::callbacks::handle_callback;
use crate::telegram::texts;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Branch order encodes the dispatch precedence:
/// 1. `/cancel` (and the Cancel button) always escapes a flow;
/// 2. an active non-Idle session state takes priority over command
///    matching, so a user mid-flow who types an unrelated command is
///    still routed to the flow's input handler;
/// 3. regular commands;
/// 4. reply-keyboard button texts and free text;
/// 5. callback queries from inline keyboards.
///
/// The same schema is used in production and in integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_cancel = deps.clone();
    let deps_dialog_filter = deps.clone();
    let deps_dialog = deps.clone();
    let deps_commands = deps.clone();
    let deps_text = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        // Cancel must win over the dialog branch
        .branch(
            Update::filter_message()
                .filter(|msg: Message| {
                    msg.text()
                        .map(|text| text.starts_with("/cancel") || text == texts::BTN_CANCEL)
                        .unwrap_or(false)
                })
                .endpoint(move |bot: Bot, msg: Message| {
                    let deps = deps_cancel.clone();
                    async move { handle_cancel(&bot, &msg, &deps).await }
                }),
        )
        // Active flow input
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().is_some())
                .filter_async(move |msg: Message| {
                    let deps = deps_dialog_filter.clone();
                    async move { deps.sessions.in_flow(msg.chat.id).await }
                })
                .endpoint(move |bot: Bot, msg: Message| {
                    let deps = deps_dialog.clone();
                    async move { handle_dialog_message(&bot, &msg, &deps).await }
                }),
        )
        // Commands
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                    let deps = deps_commands.clone();
                    async move { handle_command(&bot, &msg, cmd, &deps).await }
                }),
        )
        // Reply-keyboard buttons and free text
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().is_some())
                .endpoint(move |bot: Bot, msg: Message| {
                    let deps = deps_text.clone();
                    async move { handle_text(&bot, &msg, &deps).await }
                }),
        )
        // Inline keyboard callbacks
        .branch(Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
            let deps = deps_callback.clone();
            async move { handle_callback(&bot, q, &deps).await }
        }))
}
