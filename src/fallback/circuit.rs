//! Per-model circuit breaker state machine.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::config::ConfigError;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, all calls admitted
    Closed,
    /// Blocking all calls until the cooling period elapses
    Open,
    /// Cooling elapsed; calls admitted as recovery trials
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Validated circuit breaker parameters.
///
/// Range checks happen here, once, so per-model breakers can be created
/// lazily without a fallible path at request time.
#[derive(Debug, Clone, Copy)]
pub struct CircuitSettings {
    threshold: u32,
    cooling_period: Duration,
}

impl CircuitSettings {
    /// Validate threshold (1-20) and cooling period (5 s - 10 min).
    pub fn new(threshold: u32, cooling_period: Duration) -> Result<Self, ConfigError> {
        if !(1..=20).contains(&threshold) {
            return Err(ConfigError::Validation {
                field: "circuit.threshold".to_string(),
                message: format!("Threshold must be between 1 and 20, got {}", threshold),
            });
        }

        if cooling_period < Duration::from_secs(5) || cooling_period > Duration::from_secs(600) {
            return Err(ConfigError::Validation {
                field: "circuit.cooling_period".to_string(),
                message: format!(
                    "Cooling period must be between 5 seconds and 10 minutes, got {:?}",
                    cooling_period
                ),
            });
        }

        Ok(Self {
            threshold,
            cooling_period,
        })
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn cooling_period(&self) -> Duration {
        self.cooling_period
    }

    fn cooling_chrono(&self) -> ChronoDuration {
        // In range by construction, far below chrono's overflow bound
        ChronoDuration::milliseconds(self.cooling_period.as_millis() as i64)
    }
}

/// Read-only snapshot of a breaker for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitStateInfo {
    pub model_id: String,
    pub state: CircuitState,
    pub failure_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_retry_time: Option<DateTime<Utc>>,
}

impl CircuitStateInfo {
    /// Default info for a model whose breaker was never created.
    pub fn closed(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_time: None,
            next_retry_time: None,
        }
    }
}

#[derive(Debug)]
struct CircuitInner {
    failure_count: u32,
    last_failure: Option<DateTime<Utc>>,
    state: CircuitState,
}

/// Thread-safe circuit breaker for one model.
///
/// All mutable fields live behind a single mutex; every operation reads
/// and writes them under one acquisition so the `Open` state and the
/// failure count can never be observed out of sync.
#[derive(Debug)]
pub struct CircuitBreaker {
    settings: CircuitSettings,
    inner: Mutex<CircuitInner>,
}

impl CircuitBreaker {
    pub fn new(settings: CircuitSettings) -> Self {
        Self {
            settings,
            inner: Mutex::new(CircuitInner {
                failure_count: 0,
                last_failure: None,
                state: CircuitState::Closed,
            }),
        }
    }

    /// Validate parameters and construct in one step.
    pub fn with_params(threshold: u32, cooling_period: Duration) -> Result<Self, ConfigError> {
        Ok(Self::new(CircuitSettings::new(threshold, cooling_period)?))
    }

    fn lock(&self) -> MutexGuard<'_, CircuitInner> {
        // A panic while holding the lock leaves plain data; keep serving it
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Record a failure. Opens the circuit once the threshold is reached.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.failure_count += 1;
        inner.last_failure = Some(Utc::now());

        if inner.failure_count >= self.settings.threshold {
            inner.state = CircuitState::Open;
        }
    }

    /// Record a success. Closes the circuit and resets the failure count,
    /// from any prior state.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.failure_count = 0;
        inner.state = CircuitState::Closed;
    }

    /// Whether a request to this model should be attempted now.
    ///
    /// Open circuits flip to half-open once the cooling period elapses;
    /// half-open admits every call as a trial, not just a single probe.
    pub fn should_allow(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled = inner
                    .last_failure
                    .map(|t| Utc::now() - t > self.settings.cooling_chrono())
                    .unwrap_or(true);

                if cooled {
                    inner.state = CircuitState::HalfOpen;
                }
                cooled
            }
        }
    }

    /// Hard reset to closed with zero failures (operator action).
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.failure_count = 0;
        inner.last_failure = None;
        inner.state = CircuitState::Closed;
    }

    /// When an open circuit will next admit a trial request.
    pub fn next_retry_time(&self) -> Option<DateTime<Utc>> {
        let inner = self.lock();
        next_retry(&inner, &self.settings)
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    pub fn threshold(&self) -> u32 {
        self.settings.threshold
    }

    pub fn cooling_period(&self) -> Duration {
        self.settings.cooling_period
    }

    /// Consistent snapshot of the breaker under a single lock acquisition.
    pub fn state_info(&self, model_id: &str) -> CircuitStateInfo {
        let inner = self.lock();
        CircuitStateInfo {
            model_id: model_id.to_string(),
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure_time: inner.last_failure,
            next_retry_time: next_retry(&inner, &self.settings),
        }
    }

    /// Shift the last failure into the past to simulate cooling elapse.
    #[cfg(test)]
    pub(crate) fn backdate_last_failure(&self, by: ChronoDuration) {
        let mut inner = self.lock();
        if let Some(t) = inner.last_failure {
            inner.last_failure = Some(t - by);
        }
    }
}

fn next_retry(inner: &CircuitInner, settings: &CircuitSettings) -> Option<DateTime<Utc>> {
    match (inner.state, inner.last_failure) {
        (CircuitState::Open, Some(last)) => Some(last + settings.cooling_chrono()),
        _ => None,
    }
}
