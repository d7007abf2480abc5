//! Shared bot state, mirroring `commander-telegram::state::TelegramState`'s
//! interior-locking shape.

use std::path::PathBuf;

use crazyones_models::TranslationCatalog;
use crazyones_store::{DeliveryLedgerStore, LocaleCatalogStore, LocaleStore, SubscriberStore, TriggerStore};
use tokio::sync::RwLock;

/// All state a command handler or the fan-out loop needs, shared across
/// `tokio::spawn`ed tasks via `Arc<BotState>`.
///
/// The stores themselves are cheap, path-holding handles (every mutation
/// reloads from disk and persists atomically), so the `RwLock` here
/// guards read/write *ordering* between the dispatcher and the fan-out
/// loop rather than any in-memory cache — matching spec §5's "single
/// writer lock, readers use a snapshot" requirement.
pub struct BotState {
    data_dir: PathBuf,
    pub subscribers: RwLock<SubscriberStore>,
    pub ledger: RwLock<DeliveryLedgerStore>,
    pub locales: LocaleCatalogStore,
    pub updates: LocaleStore,
    pub triggers: TriggerStore,
    pub translations: TranslationCatalog,
}

impl BotState {
    pub fn new(data_dir: PathBuf, translations: TranslationCatalog) -> Self {
        Self {
            subscribers: RwLock::new(SubscriberStore::new(&data_dir)),
            ledger: RwLock::new(DeliveryLedgerStore::new(&data_dir)),
            locales: LocaleCatalogStore::new(&data_dir),
            updates: LocaleStore::new(&data_dir),
            triggers: TriggerStore::new(&data_dir),
            translations,
            data_dir,
        }
    }

    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }
}
