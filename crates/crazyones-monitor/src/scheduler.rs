//! The monitor's tick scheduler (spec §4.5).
//!
//! States: `Idle -> Running -> Sleeping -> Running -> ... -> Stopping`.
//! The inter-tick sleep is interruptible via a `tokio::sync::watch`
//! shutdown flag so a signal aborts it immediately instead of waiting
//! out the full interval.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::error::Result;
use crate::tick::{run_tick, TickConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Sleeping,
    Stopping,
}

/// Runs ticks on `interval` until `shutdown` fires, exposing the current
/// state for introspection (used by `--log` and tests).
pub async fn run(
    client: reqwest::Client,
    config: TickConfig,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    state: Arc<Mutex<SchedulerState>>,
) -> Result<()> {
    *state.lock().unwrap() = SchedulerState::Idle;

    loop {
        if *shutdown.borrow() {
            break;
        }

        *state.lock().unwrap() = SchedulerState::Running;
        info!("tick starting");
        match run_tick(&client, &config).await {
            Ok(outcome) => {
                info!(
                    locales_considered = outcome.locales_considered,
                    locales_changed = outcome.locales_changed,
                    trigger_written = outcome.trigger_written,
                    "tick complete"
                );
            }
            Err(e) => {
                error!(error = %e, "tick failed");
            }
        }

        if *shutdown.borrow() {
            break;
        }

        *state.lock().unwrap() = SchedulerState::Sleeping;
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {}
        }
    }

    *state.lock().unwrap() = SchedulerState::Stopping;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_constant_is_idle() {
        assert_eq!(SchedulerState::Idle, SchedulerState::Idle);
    }

    #[tokio::test]
    async fn shutdown_signal_set_before_first_tick_stops_immediately() {
        let (tx, rx) = watch::channel(true);
        let _ = tx;
        let state = Arc::new(Mutex::new(SchedulerState::Idle));
        let config = TickConfig {
            data_dir: std::env::temp_dir().join("crazyones-scheduler-test-unused"),
            index_url: "https://example.com/unused".to_string(),
        };

        run(reqwest::Client::new(), config, Duration::from_secs(1), rx, Arc::clone(&state))
            .await
            .unwrap();

        assert_eq!(*state.lock().unwrap(), SchedulerState::Stopping);
    }
}
