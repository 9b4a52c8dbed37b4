// [libs/infra/store/src/sweeper.rs]
//! Background hygiene daemon: evicts replay records, rate-limit
//! windows, and inactive sessions past their retention window, via a
//! `tokio::interval` loop spawned once at startup.

use crate::Store;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, warn};

const NORMAL_INTERVAL_S: u64 = 60;
/// Consecutive-failure threshold after which the sweeper backs off to
/// a slower cadence rather than hammering a broken dependency.
const FAILURE_BACKOFF_THRESHOLD: u32 = 5;
const BACKED_OFF_INTERVAL_S: u64 = 300;

fn run_sweep_tick(store: &Store) {
    let replay_purged = store.replay.retain_unexpired();
    if replay_purged > 0 {
        info!(count = replay_purged, "purged expired replay records");
    }

    let rate_limit_purged = store.rate_limits.sweep_expired();
    if rate_limit_purged > 0 {
        info!(count = rate_limit_purged, "purged expired rate-limit windows");
    }

    let sessions_deactivated = store.sessions.retain_active();
    if sessions_deactivated > 0 {
        warn!(count = sessions_deactivated, "pruned terminated sessions from memory");
    }
}

/// Starts the retention sweeper on the current Tokio runtime. Runs
/// until the process exits; there is no shutdown signal because the
/// gateway process itself is the unit of lifecycle.
///
/// A tick that panics counts as a failure rather than taking the whole
/// daemon down; after [`FAILURE_BACKOFF_THRESHOLD`] consecutive
/// failures the cadence backs off to [`BACKED_OFF_INTERVAL_S`] and
/// recovers to normal speed the moment a tick succeeds again.
pub fn spawn_retention_sweeper(store: Store) {
    tokio::spawn(async move {
        info!("retention sweeper started");
        let mut ticker = interval(Duration::from_secs(NORMAL_INTERVAL_S));
        let mut backed_off = false;
        let mut consecutive_failures: u32 = 0;

        loop {
            ticker.tick().await;

            let result = std::panic::catch_unwind(AssertUnwindSafe(|| run_sweep_tick(&store)));

            match result {
                Ok(()) => {
                    consecutive_failures = 0;
                    if backed_off {
                        info!("retention sweeper recovered, returning to normal cadence");
                        ticker = interval(Duration::from_secs(NORMAL_INTERVAL_S));
                        backed_off = false;
                    }
                }
                Err(panic) => {
                    consecutive_failures += 1;
                    error!(
                        consecutive_failures,
                        "retention sweeper tick panicked: {}",
                        panic_message(&panic)
                    );
                    if !backed_off && consecutive_failures >= FAILURE_BACKOFF_THRESHOLD {
                        warn!(
                            interval_s = BACKED_OFF_INTERVAL_S,
                            "retention sweeper backing off after repeated failures"
                        );
                        ticker = interval(Duration::from_secs(BACKED_OFF_INTERVAL_S));
                        backed_off = true;
                    }
                }
            }
        }
    });
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
