//! CrazyOnes monitor: periodic multi-locale scraper and trigger writer.
//!
//! Runs a scheduled pipeline that reconciles Apple's locale index,
//! scrapes every locale's security-releases table, assigns stable ids
//! to newly observed records, and writes a single trigger document for
//! the bot binary to consume.

pub mod error;
pub mod scheduler;
pub mod tick;

pub use error::{MonitorError, Result};
pub use scheduler::SchedulerState;
pub use tick::{TickConfig, TickOutcome};
