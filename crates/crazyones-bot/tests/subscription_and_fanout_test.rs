//! Integration tests for the subscription and fan-out bookkeeping (spec
//! §8 scenarios 4 and 5): the `fan_out_locale` step itself requires a
//! live Telegram connection, so these exercise the store interactions
//! it is built from directly, the way `commander-telegram`'s
//! `rebuild_detection_test.rs` exercises persistence and state
//! transitions without a running bot.

use std::collections::BTreeSet;
use std::str::FromStr;

use crazyones_models::LocaleTag;
use crazyones_store::{DeliveryLedgerStore, LocaleStore, SubscriberStore};
use tempfile::tempdir;

fn update(id: u32, name: &str, target: &str, date: &str) -> crazyones_models::SecurityUpdate {
    crazyones_models::SecurityUpdate {
        id,
        name: name.to_string(),
        url: None,
        target: target.to_string(),
        date: date.to_string(),
    }
}

/// Scenario 4: a subscriber chooses a locale, the monitor reconciles in
/// new records, and the fan-out step's novelty-minus-delivered diff
/// is exactly what it should send, then records it so the same trigger
/// would not be resent.
#[test]
fn subscribe_then_novelty_is_sent_once() {
    let dir = tempdir().unwrap();
    let subscribers = SubscriberStore::new(dir.path());
    let locales = LocaleStore::new(dir.path());
    let ledger = DeliveryLedgerStore::new(dir.path());
    let en = LocaleTag::from_str("en-us").unwrap();

    let subscriber = subscribers.upsert(111, en.clone()).unwrap();
    assert!(subscriber.active);

    let novelty = locales
        .reconcile(&en, vec![update(0, "iOS 17.5", "iPhone", "2024-05-13"), update(0, "macOS 14.5", "Mac", "2024-05-13")])
        .unwrap();
    assert_eq!(novelty, BTreeSet::from([1, 2]));

    let delivered = ledger.load().unwrap().delivered(subscriber.chat_id, &en);
    let to_send: BTreeSet<u32> = novelty.difference(&delivered).copied().collect();
    assert_eq!(to_send, BTreeSet::from([1, 2]));

    for id in &to_send {
        ledger.record_and_flush(subscriber.chat_id, en.clone(), *id).unwrap();
    }

    // A second trigger for the same novelty (e.g. a retried tick) must
    // not re-deliver anything already recorded.
    let delivered_again = ledger.load().unwrap().delivered(subscriber.chat_id, &en);
    let to_send_again: BTreeSet<u32> = novelty.difference(&delivered_again).copied().collect();
    assert!(to_send_again.is_empty());
}

/// Scenario 5: once a subscriber is deactivated (the fan-out loop's
/// reaction to a "blocked" send outcome, or an explicit /stop), it no
/// longer appears among active subscribers for its locale and receives
/// no further deliveries.
#[test]
fn deactivated_subscriber_is_excluded_from_future_fanout() {
    let dir = tempdir().unwrap();
    let subscribers = SubscriberStore::new(dir.path());
    let en = LocaleTag::from_str("en-us").unwrap();

    subscribers.upsert(1, en.clone()).unwrap();
    subscribers.upsert(2, en.clone()).unwrap();

    let active_before = subscribers.active_for_locale(&en).unwrap();
    assert_eq!(active_before.len(), 2);

    // Simulate the fan-out loop's reaction to a Blocked send outcome.
    subscribers.deactivate(1).unwrap();

    let active_after = subscribers.active_for_locale(&en).unwrap();
    assert_eq!(active_after.len(), 1);
    assert_eq!(active_after[0].chat_id, 2);

    // /start re-subscribing reactivates rather than duplicating.
    let resubscribed = subscribers.upsert(1, en.clone()).unwrap();
    assert!(resubscribed.active);
    assert_eq!(subscribers.active_for_locale(&en).unwrap().len(), 2);
}

/// Two subscribers on different locales only ever see their own
/// locale's novelty, confirming fan-out is scoped per locale.
#[test]
fn fanout_scoping_is_per_locale() {
    let dir = tempdir().unwrap();
    let subscribers = SubscriberStore::new(dir.path());
    let en = LocaleTag::from_str("en-us").unwrap();
    let es = LocaleTag::from_str("es-es").unwrap();

    subscribers.upsert(1, en.clone()).unwrap();
    subscribers.upsert(2, es.clone()).unwrap();

    assert_eq!(subscribers.active_for_locale(&en).unwrap().len(), 1);
    assert_eq!(subscribers.active_for_locale(&es).unwrap().len(), 1);
    assert_eq!(subscribers.active_for_locale(&en).unwrap()[0].chat_id, 1);
}
