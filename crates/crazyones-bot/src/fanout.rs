//! Trigger watcher and fan-out loop (spec §4.8), structurally identical
//! to `commander-telegram::bot::poll_notifications_loop`.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crazyones_models::{LocaleTag, SecurityUpdate};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::state::BotState;

const POLL_INTERVAL: Duration = Duration::from_secs(30);
const MAX_SEND_ATTEMPTS: u32 = 5;

/// Classification of a single send attempt, derived from
/// `teloxide::RequestError` variants (spec §4.8).
#[derive(Debug, PartialEq)]
enum SendOutcome {
    Sent,
    Transient { retry_after: Option<Duration> },
    Blocked,
    Other(String),
}

fn classify(err: &teloxide::RequestError) -> SendOutcome {
    use teloxide::RequestError;

    match err {
        RequestError::Network(_) => SendOutcome::Transient { retry_after: None },
        RequestError::RetryAfter(seconds) => SendOutcome::Transient { retry_after: Some(seconds.duration()) },
        RequestError::Api(api_err) => {
            let message = api_err.to_string().to_lowercase();
            if message.contains("blocked") || message.contains("chat not found") || message.contains("kicked") {
                SendOutcome::Blocked
            } else {
                SendOutcome::Other(api_err.to_string())
            }
        }
        other => SendOutcome::Other(other.to_string()),
    }
}

/// Sends one message, retrying transient failures with doubling backoff
/// capped at [`MAX_SEND_ATTEMPTS`] attempts and honoring an explicit
/// `RetryAfter` duration exactly.
async fn send_with_retry(bot: &Bot, chat_id: ChatId, text: &str) -> SendOutcome {
    let mut backoff = Duration::from_secs(1);

    for attempt in 1..=MAX_SEND_ATTEMPTS {
        match bot.send_message(chat_id, text).await {
            Ok(_) => return SendOutcome::Sent,
            Err(e) => match classify(&e) {
                SendOutcome::Transient { retry_after } if attempt < MAX_SEND_ATTEMPTS => {
                    let wait = retry_after.unwrap_or(backoff);
                    warn!(chat_id = %chat_id, attempt, wait_secs = wait.as_secs(), "transient send failure, retrying");
                    tokio::time::sleep(wait).await;
                    backoff *= 2;
                }
                other => return other,
            },
        }
    }

    SendOutcome::Other("exhausted retry attempts".to_string())
}

fn format_record(record: &SecurityUpdate) -> String {
    match &record.url {
        Some(url) => format!("🔔 {} — {} ({})\n{}", record.name, record.target, record.date, url),
        None => format!("🔔 {} — {} ({})", record.name, record.target, record.date),
    }
}

/// Processes one `(locale, novelty-ids)` pair: sends every undelivered
/// id, in ascending order, to every active subscriber of that locale.
async fn fan_out_locale(bot: &Bot, state: &Arc<BotState>, locale: &LocaleTag, ids: &BTreeSet<u32>) {
    let records = match state.updates.load(locale) {
        Ok(r) => r,
        Err(e) => {
            warn!(locale = %locale, error = %e, "failed to load locale store during fan-out");
            return;
        }
    };

    let by_id: std::collections::BTreeMap<u32, &SecurityUpdate> = records.iter().map(|r| (r.id, r)).collect();

    let subscribers = match state.subscribers.read().await.active_for_locale(locale) {
        Ok(s) => s,
        Err(e) => {
            warn!(locale = %locale, error = %e, "failed to load subscribers during fan-out");
            return;
        }
    };

    for subscriber in subscribers {
        let delivered = state.ledger.read().await.load().map(|l| l.delivered(subscriber.chat_id, locale)).unwrap_or_default();
        let to_send: BTreeSet<u32> = ids.difference(&delivered).copied().collect();

        for id in to_send {
            let Some(record) = by_id.get(&id) else {
                continue;
            };

            match send_with_retry(bot, ChatId(subscriber.chat_id), &format_record(record)).await {
                SendOutcome::Sent => {
                    if let Err(e) = state.ledger.write().await.record_and_flush(subscriber.chat_id, locale.clone(), id) {
                        warn!(chat_id = subscriber.chat_id, locale = %locale, id, error = %e, "failed to persist delivery ledger entry");
                    }
                }
                SendOutcome::Blocked => {
                    info!(chat_id = subscriber.chat_id, "subscriber blocked the bot, deactivating");
                    if let Err(e) = state.subscribers.write().await.deactivate(subscriber.chat_id) {
                        warn!(chat_id = subscriber.chat_id, error = %e, "failed to deactivate blocked subscriber");
                    }
                    break;
                }
                SendOutcome::Transient { .. } => {
                    warn!(chat_id = subscriber.chat_id, locale = %locale, id, "send still failing after retries, will retry next trigger");
                }
                SendOutcome::Other(reason) => {
                    warn!(chat_id = subscriber.chat_id, locale = %locale, id, reason = %reason, "send failed permanently, skipping");
                }
            }
        }
    }
}

/// Polls for the trigger document every 30 seconds and fans out novelty
/// to subscribers, exactly as `poll_notifications_loop` is structured in
/// the teacher, generalized to CrazyOnes's per-locale trigger shape.
pub async fn watch_triggers(bot: Bot, state: Arc<BotState>, mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }

        let Some(trigger) = state.triggers.take() else {
            debug!("no trigger document pending");
            continue;
        };

        for (locale, ids) in trigger.iter() {
            if ids.is_empty() {
                continue;
            }
            fan_out_locale(&bot, &state, locale, ids).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_message_is_classified_as_blocked() {
        // RequestError::Api variants carry an ApiError; constructing one
        // directly requires teloxide's internal JSON shape, so this test
        // exercises the string-matching rule in isolation instead.
        let message = "Forbidden: bot was blocked by the user".to_lowercase();
        assert!(message.contains("blocked"));
    }
}
