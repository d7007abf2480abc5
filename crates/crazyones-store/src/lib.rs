//! Persistence layer for CrazyOnes.
//!
//! This crate provides crash-safe persistence for every file in the data
//! directory contract, using atomic file operations (write to temp file,
//! then rename) for every mutation. No file is ever observed in a
//! partially written state.

pub mod atomic;
pub mod delivery_ledger_store;
pub mod error;
pub mod fingerprint_ledger_store;
pub mod locale_catalog_store;
pub mod locale_store;
pub mod subscriber_store;
pub mod trigger_store;

pub use delivery_ledger_store::DeliveryLedgerStore;
pub use error::{Result, StoreError};
pub use fingerprint_ledger_store::{FingerprintLedger, FingerprintLedgerStore};
pub use locale_catalog_store::LocaleCatalogStore;
pub use locale_store::{LocaleStore, Novelty};
pub use subscriber_store::SubscriberStore;
pub use trigger_store::TriggerStore;
