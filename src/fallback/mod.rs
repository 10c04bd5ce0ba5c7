//! Fallback escalation with per-model circuit breakers.
//!
//! Walks configured fallback chains when a model is unusable and tracks
//! per-model failure state so repeatedly-failing models are skipped
//! instead of retried on every request.

mod circuit;
mod types;

pub use circuit::{CircuitBreaker, CircuitSettings, CircuitState, CircuitStateInfo};
pub use types::{EscalationTrigger, FallbackContext, FallbackResult};

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ConfigError, FallbackConfig};
use crate::registry::ModelRegistry;
use crate::routing::AgentRole;

/// Handles model fallback escalation.
///
/// Owns one [`CircuitBreaker`] per model id ever reported to it, created
/// lazily via an atomic get-or-insert on the circuit map. Breakers are
/// never removed for the process lifetime; an operator can reset them.
pub struct FallbackHandler {
    registry: Arc<ModelRegistry>,
    config: FallbackConfig,
    circuit_settings: CircuitSettings,
    circuits: DashMap<String, CircuitBreaker>,
}

impl FallbackHandler {
    /// Create a handler, validating the fallback configuration eagerly.
    pub fn new(registry: Arc<ModelRegistry>, config: FallbackConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let circuit_settings =
            CircuitSettings::new(config.failure_threshold, config.cooling_period())?;

        Ok(Self {
            registry,
            config,
            circuit_settings,
            circuits: DashMap::new(),
        })
    }

    /// Walk the applicable fallback chain and return the first viable model.
    ///
    /// The role-specific chain overrides the global one. Candidates are
    /// skipped when they equal the original failing model, when their
    /// circuit refuses the call, or when the registry reports them
    /// unavailable. Exhaustion is returned as a failed result carrying
    /// the attempted list and a per-model reason map; it never panics.
    pub fn get_fallback(&self, role: AgentRole, context: &FallbackContext) -> FallbackResult {
        let chain = self.config.effective_chain(role);
        let mut attempted: Vec<String> = Vec::new();
        let mut failure_reasons: HashMap<String, String> = HashMap::new();

        if chain.is_empty() {
            tracing::error!(role = %role, "no fallback chain configured");
            return FallbackResult::failed(
                format!("No fallback chain configured for role {}", role),
                attempted,
            );
        }

        let original = context.original_model.as_deref().unwrap_or("none");

        for model_id in chain {
            // Never re-select the model that originally failed
            if Some(model_id.as_str()) == context.original_model.as_deref() {
                continue;
            }

            attempted.push(model_id.clone());

            let circuit = self.circuit(model_id);
            if !circuit.should_allow() {
                let reason = format!("circuit breaker {}", circuit.state());
                drop(circuit);

                tracing::debug!(model_id = %model_id, reason = %reason, "skipping fallback candidate");
                failure_reasons.insert(model_id.clone(), reason);
                continue;
            }
            drop(circuit);

            if !self.registry.is_model_available(model_id) {
                tracing::debug!(model_id = %model_id, reason = "unavailable", "skipping fallback candidate");
                failure_reasons.insert(model_id.clone(), "unavailable".to_string());
                continue;
            }

            tracing::warn!(
                original = %original,
                fallback = %model_id,
                role = %role,
                trigger = %context.trigger,
                session_id = ?context.session_id,
                "fallback triggered"
            );
            metrics::counter!(
                "acode_fallbacks_total",
                "from" => original.to_string(),
                "to" => model_id.clone()
            )
            .increment(1);

            return FallbackResult::succeeded(
                model_id.clone(),
                format!("{} {}, using {}", original, context.trigger, model_id),
                attempted,
            );
        }

        let tried = attempted.join(", ");
        tracing::error!(
            role = %role,
            tried = %tried,
            reasons = ?failure_reasons,
            session_id = ?context.session_id,
            "all fallbacks exhausted"
        );

        FallbackResult::failed_with_reasons(
            format!("All fallbacks exhausted for role {}. Tried: {}", role, tried),
            attempted,
            failure_reasons,
        )
    }

    /// Record a failed call against a model's circuit.
    ///
    /// No-op for a blank model id.
    pub fn notify_failure(&self, model_id: &str, error: &dyn std::error::Error) {
        if model_id.trim().is_empty() {
            return;
        }

        let circuit = self.circuit(model_id);
        circuit.record_failure();

        if circuit.state() == CircuitState::Open {
            tracing::warn!(
                model_id = %model_id,
                failures = circuit.failure_count(),
                cooling_secs = self.circuit_settings.cooling_period().as_secs(),
                error = %error,
                "circuit opened"
            );
            metrics::counter!("acode_circuit_opened_total", "model" => model_id.to_string())
                .increment(1);
        } else {
            tracing::debug!(
                model_id = %model_id,
                count = circuit.failure_count(),
                threshold = self.circuit_settings.threshold(),
                "failure recorded"
            );
        }
    }

    /// Record a successful call, closing the model's circuit if it exists.
    ///
    /// No-op for a blank or never-referenced model id.
    pub fn notify_success(&self, model_id: &str) {
        if model_id.trim().is_empty() {
            return;
        }

        if let Some(circuit) = self.circuits.get(model_id) {
            let previous = circuit.state();
            circuit.record_success();

            if previous != CircuitState::Closed {
                tracing::info!(
                    model_id = %model_id,
                    previous_state = %previous,
                    "circuit closed after successful request"
                );
            }
        }
    }

    /// Whether a model's circuit is currently open.
    pub fn is_circuit_open(&self, model_id: &str) -> bool {
        if model_id.trim().is_empty() {
            return false;
        }

        self.circuit(model_id).state() == CircuitState::Open
    }

    /// Reset one model's circuit (operator action).
    pub fn reset_circuit(&self, model_id: &str) {
        if model_id.trim().is_empty() {
            return;
        }

        if let Some(circuit) = self.circuits.get(model_id) {
            circuit.reset();
            tracing::info!(model_id = %model_id, "circuit reset");
        }
    }

    /// Reset every circuit ever created. Order is unspecified.
    pub fn reset_all_circuits(&self) {
        for entry in self.circuits.iter() {
            entry.value().reset();
        }

        tracing::info!(count = self.circuits.len(), "all circuits reset");
    }

    /// Current state of one model's circuit.
    ///
    /// Blank ids get a default closed snapshot rather than an error.
    pub fn get_circuit_state(&self, model_id: &str) -> CircuitStateInfo {
        if model_id.trim().is_empty() {
            return CircuitStateInfo::closed(model_id);
        }

        self.circuit(model_id).state_info(model_id)
    }

    /// Snapshot of every circuit ever created.
    pub fn get_all_circuit_states(&self) -> HashMap<String, CircuitStateInfo> {
        self.circuits
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().state_info(entry.key())))
            .collect()
    }

    /// Whether any chain (role-specific or global) applies to a role.
    pub fn has_chain_for(&self, role: AgentRole) -> bool {
        !self.config.effective_chain(role).is_empty()
    }

    /// Get or lazily create the circuit for a model.
    ///
    /// The map-level entry API makes concurrent first references converge
    /// on a single breaker instance.
    fn circuit(
        &self,
        model_id: &str,
    ) -> dashmap::mapref::one::RefMut<'_, String, CircuitBreaker> {
        self.circuits
            .entry(model_id.to_string())
            .or_insert_with(|| CircuitBreaker::new(self.circuit_settings))
    }
}
