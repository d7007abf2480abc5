//! Shared business logic for CrazyOnes: locale-index reconciliation,
//! page scraping and fingerprinting, date grammars, fuzzy matching,
//! translation loading, and single-instance enforcement. Used by both
//! the monitor and bot binaries.

pub mod config;
pub mod date_grammar;
pub mod error;
pub mod fuzzy;
pub mod instance_lock;
pub mod reconciler;
pub mod scrape;
pub mod translation;

pub use error::{CoreError, Result};
pub use instance_lock::InstanceLock;
pub use reconciler::{reconcile, Reconciliation};
