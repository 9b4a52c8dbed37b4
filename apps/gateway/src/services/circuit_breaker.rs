// [apps/gateway/src/services/circuit_breaker.rs]
//! Per-service circuit breakers: `stt`, `tts`, `l1`, `l2`,
//! `ambiguity`, `dispatch`. `CLOSED -> OPEN` on N consecutive failures,
//! `OPEN -> HALF_OPEN` after a recovery timeout with a single probe,
//! `HALF_OPEN -> CLOSED` on probe success or back to `OPEN` on probe
//! failure. State is per-name and updated by any caller, so every
//! mutation runs under the service's own lock.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub recovery_seconds: i64,
}

#[derive(Debug, Clone)]
struct BreakerEntry {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<DateTime<Utc>>,
    half_open_probe_in_flight: bool,
}

impl Default for BreakerEntry {
    fn default() -> Self {
        Self { state: BreakerState::Closed, consecutive_failures: 0, opened_at: None, half_open_probe_in_flight: false }
    }
}

/// Per-service defaults: threshold 3-5, recovery 30-120s, half-open
/// probe limit 1.
pub fn default_config(service: &str) -> BreakerConfig {
    match service {
        "stt" => BreakerConfig { failure_threshold: 3, recovery_seconds: 30 },
        "tts" => BreakerConfig { failure_threshold: 3, recovery_seconds: 30 },
        "l1" => BreakerConfig { failure_threshold: 5, recovery_seconds: 60 },
        "l2" => BreakerConfig { failure_threshold: 5, recovery_seconds: 60 },
        "ambiguity" => BreakerConfig { failure_threshold: 4, recovery_seconds: 60 },
        "dispatch" => BreakerConfig { failure_threshold: 3, recovery_seconds: 120 },
        _ => BreakerConfig { failure_threshold: 5, recovery_seconds: 60 },
    }
}

#[derive(Default)]
pub struct CircuitBreakerRegistry {
    entries: DashMap<String, Mutex<BreakerEntry>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a call to `service` may proceed right now.
    /// Transitions `OPEN -> HALF_OPEN` in place when the recovery
    /// timeout has elapsed, admitting exactly one probe.
    pub fn allow(&self, service: &str) -> bool {
        let config = default_config(service);
        let entry = self.entries.entry(service.to_string()).or_default();
        let mut guard = entry.lock().expect("circuit breaker lock poisoned");

        match guard.state {
            BreakerState::Closed => true,
            BreakerState::HalfOpen => {
                if guard.half_open_probe_in_flight {
                    false
                } else {
                    guard.half_open_probe_in_flight = true;
                    true
                }
            }
            BreakerState::Open => {
                let elapsed = guard
                    .opened_at
                    .map(|opened| (Utc::now() - opened).num_seconds())
                    .unwrap_or(i64::MAX);
                if elapsed >= config.recovery_seconds {
                    guard.state = BreakerState::HalfOpen;
                    guard.half_open_probe_in_flight = true;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self, service: &str) {
        let entry = self.entries.entry(service.to_string()).or_default();
        let mut guard = entry.lock().expect("circuit breaker lock poisoned");
        guard.state = BreakerState::Closed;
        guard.consecutive_failures = 0;
        guard.opened_at = None;
        guard.half_open_probe_in_flight = false;
    }

    pub fn record_failure(&self, service: &str) {
        let config = default_config(service);
        let entry = self.entries.entry(service.to_string()).or_default();
        let mut guard = entry.lock().expect("circuit breaker lock poisoned");

        guard.half_open_probe_in_flight = false;
        if guard.state == BreakerState::HalfOpen {
            guard.state = BreakerState::Open;
            guard.opened_at = Some(Utc::now());
            guard.consecutive_failures = config.failure_threshold;
            return;
        }

        guard.consecutive_failures += 1;
        if guard.consecutive_failures >= config.failure_threshold {
            guard.state = BreakerState::Open;
            guard.opened_at = Some(Utc::now());
        }
    }

    pub fn state_of(&self, service: &str) -> BreakerState {
        self.entries.entry(service.to_string()).or_default().lock().expect("circuit breaker lock poisoned").state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let registry = CircuitBreakerRegistry::new();
        for _ in 0..3 {
            registry.record_failure("stt");
        }
        assert_eq!(registry.state_of("stt"), BreakerState::Open);
        assert!(!registry.allow("stt"));
    }

    #[test]
    fn half_open_allows_single_probe_then_blocks() {
        let registry = CircuitBreakerRegistry::new();
        for _ in 0..3 {
            registry.record_failure("dispatch");
        }
        // Force the recovery window to have already elapsed.
        {
            let entry = registry.entries.get("dispatch").unwrap();
            let mut guard = entry.lock().unwrap();
            guard.opened_at = Some(Utc::now() - chrono::Duration::seconds(200));
        }
        assert!(registry.allow("dispatch"));
        assert_eq!(registry.state_of("dispatch"), BreakerState::HalfOpen);
        assert!(!registry.allow("dispatch"));
    }

    #[test]
    fn probe_success_closes_breaker() {
        let registry = CircuitBreakerRegistry::new();
        for _ in 0..3 {
            registry.record_failure("l1");
        }
        {
            let entry = registry.entries.get("l1").unwrap();
            let mut guard = entry.lock().unwrap();
            guard.state = BreakerState::HalfOpen;
        }
        registry.record_success("l1");
        assert_eq!(registry.state_of("l1"), BreakerState::Closed);
        assert!(registry.allow("l1"));
    }
}
