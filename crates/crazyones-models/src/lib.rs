//! Core data models for CrazyOnes.
//!
//! This crate provides the fundamental data types shared by the monitor
//! and bot binaries: locale identifiers, the per-locale security-update
//! records, subscriber state, the delivery ledger, and the inter-process
//! trigger document.

pub mod delivery;
pub mod locale;
pub mod security_update;
pub mod subscriber;
pub mod translation;
pub mod trigger;

pub use delivery::DeliveryLedger;
pub use locale::{LocaleCatalog, LocaleError, LocaleTag};
pub use security_update::{ContentIdentity, SecurityUpdate, SENTINEL_DATE};
pub use subscriber::Subscriber;
pub use translation::TranslationCatalog;
pub use trigger::Trigger;
