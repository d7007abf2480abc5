//! Dispatcher wiring: handler tree and polling-mode startup, following
//! `commander-telegram::bot::TelegramBot::start_polling` exactly (polling
//! only — spec.md treats the transport as an external collaborator and
//! the webhook adapter is out of scope here).

use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::Update;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::fanout::watch_triggers;
use crate::handlers::{
    handle_about, handle_callback, handle_help, handle_language, handle_my_chat_member, handle_start, handle_stop,
    handle_unknown_command, handle_updates, Command,
};
use crate::state::BotState;

/// Builds the dispatcher handler tree and runs it to completion (either
/// on ctrl-c or on `shutdown` firing). The trigger watcher runs
/// concurrently as its own spawned task, mirroring how the teacher runs
/// `poll_output_loop` and `poll_notifications_loop` alongside the
/// dispatcher.
pub async fn run_polling(bot: Bot, state: Arc<BotState>, shutdown: watch::Receiver<bool>) {
    let fanout_bot = bot.clone();
    let fanout_state = Arc::clone(&state);
    let fanout_shutdown = shutdown.clone();
    tokio::spawn(async move {
        watch_triggers(fanout_bot, fanout_state, fanout_shutdown).await;
    });

    let command_state = Arc::clone(&state);
    let callback_state = Arc::clone(&state);
    let unknown_state = Arc::clone(&state);
    let membership_state = Arc::clone(&state);

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(move |bot: Bot, q: teloxide::types::CallbackQuery| {
            let state = Arc::clone(&callback_state);
            async move { handle_callback(bot, q, state).await }
        }))
        .branch(
            Update::filter_my_chat_member().endpoint(move |update: teloxide::types::ChatMemberUpdated| {
                let state = Arc::clone(&membership_state);
                async move { handle_my_chat_member(update, state).await }
            }),
        )
        .branch(Update::filter_message().filter_command::<Command>().endpoint(
            move |bot: Bot, msg: Message, cmd: Command| {
                let state = Arc::clone(&command_state);
                info!(chat_id = %msg.chat.id, command = ?cmd, "command matched");
                async move { dispatch_command(bot, msg, cmd, state).await }
            },
        ))
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().map(|t| t.starts_with('/')).unwrap_or(false))
                .endpoint(move |bot: Bot, msg: Message| {
                    let state = Arc::clone(&unknown_state);
                    async move {
                        let text = msg.text().unwrap_or_default().to_string();
                        handle_unknown_command(bot, msg, state, &text).await
                    }
                }),
        );

    info!("bot dispatcher starting (polling mode)");

    Dispatcher::builder(bot, handler)
        .default_handler(|upd| async move {
            warn!(update = ?upd, "unhandled update");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn dispatch_command(bot: Bot, msg: Message, cmd: Command, state: Arc<BotState>) -> ResponseResult<()> {
    match cmd {
        Command::Start => handle_start(bot, msg, state).await,
        Command::Stop => handle_stop(bot, msg, state).await,
        Command::Updates(tag) => handle_updates(bot, msg, state, tag).await,
        Command::Language(code) => handle_language(bot, msg, state, code).await,
        Command::About => handle_about(bot, msg, state).await,
        Command::Help => handle_help(bot, msg, state).await,
    }
}
