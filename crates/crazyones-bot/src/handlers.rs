//! Command dispatcher (spec §4.6) and fuzzy fallback (spec §4.7).
//!
//! Handler signatures mirror `commander-telegram::handlers` exactly:
//! `(bot, msg, state, ..args) -> ResponseResult<()>`.

use std::str::FromStr;
use std::sync::Arc;

use crazyones_models::{LocaleTag, SecurityUpdate};
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use crate::state::BotState;

/// Bot commands, derived exactly as `commander-telegram::handlers::Command` is.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "subscribe and choose a locale")]
    Start,

    #[command(description = "unsubscribe from notifications")]
    Stop,

    #[command(description = "show the 10 most recent updates, optionally filtered: /updates <tag>")]
    Updates(String),

    #[command(description = "list locales, or show another locale's updates: /language <code>")]
    Language(String),

    #[command(description = "about this bot")]
    About,

    #[command(description = "show this help message")]
    Help,
}

const LOCALES_PER_PAGE: usize = 8;
const RECENT_COUNT: usize = 10;
const MAX_TAG_LEN: usize = 32;

fn default_ui_lang() -> &'static str {
    crazyones_models::translation::DEFAULT_UI_LANG
}

async fn ui_lang_for(state: &Arc<BotState>, chat_id: i64) -> String {
    state
        .subscribers
        .read()
        .await
        .find(chat_id)
        .ok()
        .flatten()
        .map(|s| s.ui_lang)
        .unwrap_or_else(|| default_ui_lang().to_string())
}

fn locale_keyboard(locales: &[(LocaleTag, String)], page: usize) -> InlineKeyboardMarkup {
    let start = page * LOCALES_PER_PAGE;
    let page_items = locales.iter().skip(start).take(LOCALES_PER_PAGE);

    let mut rows: Vec<Vec<InlineKeyboardButton>> = page_items
        .map(|(tag, name)| vec![InlineKeyboardButton::callback(name.clone(), format!("locale:{tag}"))])
        .collect();

    let mut nav = Vec::new();
    if page > 0 {
        nav.push(InlineKeyboardButton::callback("« prev", format!("locale_page:{}", page - 1)));
    }
    if start + LOCALES_PER_PAGE < locales.len() {
        nav.push(InlineKeyboardButton::callback("next »", format!("locale_page:{}", page + 1)));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    InlineKeyboardMarkup::new(rows)
}

fn sorted_locales(state: &BotState) -> crazyones_core::Result<Vec<(LocaleTag, String)>> {
    let catalog = state.locales.load()?;
    Ok(catalog
        .locales()
        .map(|l| (l.clone(), catalog.name(l).unwrap_or(l.as_str()).to_string()))
        .collect())
}

pub async fn handle_start(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let locales = match sorted_locales(&state) {
        Ok(l) => l,
        Err(e) => {
            warn!(error = %e, "failed to load locale catalog for /start");
            bot.send_message(msg.chat.id, "Locale catalog is not available yet, try again shortly.").await?;
            return Ok(());
        }
    };

    if locales.is_empty() {
        bot.send_message(msg.chat.id, "No locales are known yet, try again shortly.").await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "Choose your locale:")
        .reply_markup(locale_keyboard(&locales, 0))
        .await?;

    info!(chat_id = %msg.chat.id, "user started /start locale selection");
    Ok(())
}

pub async fn handle_stop(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    if let Err(e) = state.subscribers.write().await.deactivate(chat_id) {
        warn!(chat_id, error = %e, "failed to deactivate subscriber");
    }
    bot.send_message(msg.chat.id, "You have been unsubscribed. Send /start to subscribe again.").await?;
    info!(chat_id, "subscriber deactivated via /stop");
    Ok(())
}

fn format_entries(entries: &[&SecurityUpdate], no_data_text: &str) -> String {
    if entries.is_empty() {
        return no_data_text.to_string();
    }
    entries
        .iter()
        .map(|u| match &u.url {
            Some(url) => format!("• {} — {} ({})\n  {}", u.name, u.target, u.date, url),
            None => format!("• {} — {} ({})", u.name, u.target, u.date),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `records` is stored newest-first (index 0 = most recent, per
/// `LocaleStore::reconcile`), so the most recent [`RECENT_COUNT`]
/// matches are simply the first ones, not the last.
fn recent(records: &[SecurityUpdate], tag: Option<&str>) -> Vec<&SecurityUpdate> {
    let filtered: Box<dyn Iterator<Item = &SecurityUpdate>> = match tag {
        None => Box::new(records.iter()),
        Some(tag) => {
            let tag = tag.to_lowercase();
            Box::new(records.iter().filter(move |u| contains_word(&u.name.to_lowercase(), &tag)))
        }
    };
    filtered.take(RECENT_COUNT).collect()
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.split(|c: char| !c.is_alphanumeric()).any(|tok| tok == word)
}

pub async fn handle_updates(bot: Bot, msg: Message, state: Arc<BotState>, tag: String) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    let subscriber = match state.subscribers.read().await.find(chat_id) {
        Ok(Some(s)) => s,
        Ok(None) => {
            bot.send_message(msg.chat.id, "Send /start first to choose a locale.").await?;
            return Ok(());
        }
        Err(e) => {
            warn!(chat_id, error = %e, "failed to load subscriber for /updates");
            return Ok(());
        }
    };

    let tag = tag.trim();
    let tag = if tag.len() > MAX_TAG_LEN { &tag[..MAX_TAG_LEN] } else { tag };
    let tag_opt = if tag.is_empty() { None } else { Some(tag) };

    respond_with_updates(&bot, &msg, &state, &subscriber.locale, tag_opt).await
}

/// Resolves the text to send for `/updates`/`/language <code>`: exact tag
/// match, then fuzzy tag match with a "did you mean" notice, then a
/// not-found message. Pure and synchronous so the one level of fallback
/// never needs recursive `async fn` boxing. `no_data_text` is the
/// already-localized "no data yet" message (spec.md line 202), resolved
/// by the caller since this function has no access to the translation
/// catalog.
fn render_updates(records: &[SecurityUpdate], tag: Option<&str>, no_data_text: &str) -> String {
    if records.is_empty() {
        return no_data_text.to_string();
    }

    if let Some(tag) = tag {
        let matches = recent(records, Some(tag));
        if !matches.is_empty() {
            return format_entries(&matches, no_data_text);
        }

        let names: Vec<&str> = records.iter().map(|u| u.name.as_str()).collect();
        if let Some((candidate, _ratio)) = crazyones_core::fuzzy::best_tag_match(tag, &names) {
            let notice = format!("No exact match for \"{tag}\" — did you mean \"{candidate}\"?");
            let body = format_entries(&recent(records, Some(candidate)), no_data_text);
            return format!("{notice}\n\n{body}");
        }

        return format!("No updates found matching \"{tag}\".");
    }

    format_entries(&recent(records, None), no_data_text)
}

async fn respond_with_updates(
    bot: &Bot,
    msg: &Message,
    state: &Arc<BotState>,
    locale: &LocaleTag,
    tag: Option<&str>,
) -> ResponseResult<()> {
    let ui_lang = ui_lang_for(state, msg.chat.id.0).await;
    let (no_data_text, _fallback) = state.translations.format(&ui_lang, "no_data_yet", &[]);
    let no_data_text = if no_data_text == "no_data_yet" { "No data yet for this locale.".to_string() } else { no_data_text };

    let records = match state.updates.load(locale) {
        Ok(r) => r,
        Err(e) => {
            warn!(locale = %locale, error = %e, "failed to load locale store");
            bot.send_message(msg.chat.id, no_data_text).await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, render_updates(&records, tag, &no_data_text)).await?;
    Ok(())
}

pub async fn handle_language(bot: Bot, msg: Message, state: Arc<BotState>, code: String) -> ResponseResult<()> {
    let code = code.trim();

    if code.is_empty() {
        let locales = match sorted_locales(&state) {
            Ok(l) => l,
            Err(_) => {
                bot.send_message(msg.chat.id, "Locale catalog is not available yet.").await?;
                return Ok(());
            }
        };
        let body = locales.iter().map(|(tag, name)| format!("• {tag} — {name}")).collect::<Vec<_>>().join("\n");
        bot.send_message(msg.chat.id, format!("Known locales:\n{body}")).await?;
        return Ok(());
    }

    let Ok(locale) = LocaleTag::from_str(&code.to_lowercase()) else {
        bot.send_message(msg.chat.id, format!("\"{code}\" is not a valid locale code.")).await?;
        return Ok(());
    };

    let known = match state.locales.load() {
        Ok(c) => c.contains(&locale),
        Err(_) => false,
    };
    if !known {
        bot.send_message(msg.chat.id, format!("Unknown locale \"{code}\".")).await?;
        return Ok(());
    }

    respond_with_updates(&bot, &msg, &state, &locale, None).await
}

const ABOUT_TEXT: &str = "CrazyOnes watches Apple's security-releases page across every published \
    locale and notifies you here as soon as your locale's page changes.";

pub async fn handle_about(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let ui_lang = ui_lang_for(&state, msg.chat.id.0).await;
    let (text, _fallback) = state.translations.format(&ui_lang, "about", &[]);
    let text = if text == "about" { ABOUT_TEXT.to_string() } else { text };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

pub async fn handle_help(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let ui_lang = ui_lang_for(&state, msg.chat.id.0).await;
    let (intro, _fallback) = state.translations.format(&ui_lang, "help_intro", &[]);
    let intro = if intro == "help_intro" { String::new() } else { format!("{intro}\n\n") };
    bot.send_message(msg.chat.id, format!("{intro}{}", Command::descriptions())).await?;
    Ok(())
}

/// Callback-query handler for the `/start` locale keyboard, mirroring
/// `commander-telegram::bot`'s callback branch.
pub async fn handle_callback(bot: Bot, q: CallbackQuery, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(data) = &q.data else {
        return Ok(());
    };
    bot.answer_callback_query(&q.id).await?;

    let Some(msg) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = msg.chat().id;

    if let Some(page) = data.strip_prefix("locale_page:") {
        let Ok(page) = page.parse::<usize>() else {
            return Ok(());
        };
        let Ok(locales) = sorted_locales(&state) else {
            return Ok(());
        };
        bot.edit_message_reply_markup(chat_id, msg.id())
            .reply_markup(locale_keyboard(&locales, page))
            .await?;
        return Ok(());
    }

    if let Some(tag) = data.strip_prefix("locale:") {
        let Ok(locale) = LocaleTag::from_str(tag) else {
            return Ok(());
        };

        match state.subscribers.write().await.upsert(chat_id.0, locale.clone()) {
            Ok(subscriber) => {
                let (text, _fallback) =
                    state.translations.format(&subscriber.ui_lang, "welcome", &[subscriber.locale.as_str()]);
                let text = if text == "welcome" {
                    format!("Subscribed to {} updates. Send /help to see available commands.", subscriber.locale)
                } else {
                    text
                };
                bot.send_message(chat_id, text).await?;
                info!(chat_id = %chat_id, locale = %locale, "subscriber locale selected");
            }
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "failed to store subscriber locale selection");
                bot.send_message(chat_id, "Failed to save your selection, please try /start again.").await?;
            }
        }
    }

    Ok(())
}

const KNOWN_VERBS: [&str; 6] = ["start", "stop", "updates", "language", "about", "help"];

/// Fallback for a message that looks like a command but did not parse
/// against [`Command`] (spec §4.7's verb fuzzy-matching).
pub async fn handle_unknown_command(bot: Bot, msg: Message, state: Arc<BotState>, text: &str) -> ResponseResult<()> {
    let mut parts = text.trim_start_matches('/').splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let arg = parts.next().unwrap_or_default().to_string();

    let Some((candidate, _ratio)) = crazyones_core::fuzzy::best_verb_match(verb, &KNOWN_VERBS) else {
        bot.send_message(msg.chat.id, format!("Unknown command: /{verb}\n\nSend /help to see available commands.")).await?;
        return Ok(());
    };

    let ui_lang = ui_lang_for(&state, msg.chat.id.0).await;
    let (text, _fallback) = state.translations.format(&ui_lang, "did_you_mean", &[candidate]);
    let text = if text == "did_you_mean" { format!("Did you mean /{candidate}?") } else { text };
    bot.send_message(chat_id_of(&msg), text).await?;

    match candidate {
        "start" => handle_start(bot, msg, state).await,
        "stop" => handle_stop(bot, msg, state).await,
        "updates" => handle_updates(bot, msg, state, arg).await,
        "language" => handle_language(bot, msg, state, arg).await,
        "about" => handle_about(bot, msg, state).await,
        "help" => handle_help(bot, msg, state).await,
        _ => Ok(()),
    }
}

fn chat_id_of(msg: &Message) -> teloxide::types::ChatId {
    msg.chat.id
}

/// Membership-loss handling (spec §4.8): a `my_chat_member` update in
/// which the bot was removed or blocked deactivates the subscriber the
/// same way a blocked send does.
pub async fn handle_my_chat_member(update: teloxide::types::ChatMemberUpdated, state: Arc<BotState>) -> ResponseResult<()> {
    use teloxide::types::ChatMemberKind;

    let lost_membership = matches!(
        update.new_chat_member.kind,
        ChatMemberKind::Left | ChatMemberKind::Banned(_)
    );

    if lost_membership {
        let chat_id = update.chat.id.0;
        if let Err(e) = state.subscribers.write().await.deactivate(chat_id) {
            warn!(chat_id, error = %e, "failed to deactivate subscriber after membership loss");
        } else {
            info!(chat_id, "subscriber deactivated: bot removed or blocked");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_word_matches_whole_tokens_only() {
        assert!(contains_word("ios 17.5 and ipados 17.5", "ios"));
        assert!(!contains_word("iosx", "ios"));
    }

    #[test]
    fn recent_filters_by_tag_and_caps_at_ten_newest_first() {
        // The real store is newest-first (index 0 = most recent), so the
        // fixture must be too: id 15 at index 0, id 1 at index 14.
        let records: Vec<SecurityUpdate> = (1..=15)
            .rev()
            .map(|i| SecurityUpdate {
                id: i,
                name: format!("iOS {i}"),
                url: None,
                target: "iPhone".to_string(),
                date: "2024-01-01".to_string(),
            })
            .collect();
        let result = recent(&records, None);
        assert_eq!(result.len(), 10);
        assert_eq!(result[0].id, 15);
        assert_eq!(result[9].id, 6);
    }
}
