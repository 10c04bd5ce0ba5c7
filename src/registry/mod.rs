//! Model Registry module.
//!
//! Tracks which models the registered providers advertise and answers
//! availability queries, caching probe results for a configurable TTL so
//! routing decisions don't hammer provider health endpoints.

mod provider;
#[cfg(test)]
mod tests;

pub use provider::*;

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default availability-cache TTL when none is configured.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// The Model Registry answers "which models exist" and "is this model up".
///
/// Availability is determined by probing the owning provider's health
/// endpoint and cached per model id. Within the TTL window concurrent
/// callers observe the same cached boolean; when the TTL expires under
/// concurrent load the refresh race resolves last-write-wins, which is
/// acceptable for a performance cache.
///
/// # Examples
///
/// ```
/// use acode_routing::registry::ModelRegistry;
///
/// let registry = ModelRegistry::new(vec![]);
/// assert!(!registry.is_model_available("llama3.2:7b"));
/// assert!(registry.list_available_models().is_empty());
/// ```
pub struct ModelRegistry {
    providers: Vec<Arc<dyn ModelProvider>>,
    availability_cache: DashMap<String, CachedAvailability>,
    cache_ttl: Duration,
}

#[derive(Debug, Clone, Copy)]
struct CachedAvailability {
    available: bool,
    cached_at: Instant,
}

impl CachedAvailability {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

impl ModelRegistry {
    /// Create a registry with the default cache TTL.
    pub fn new(providers: Vec<Arc<dyn ModelProvider>>) -> Self {
        Self::with_cache_ttl(providers, DEFAULT_CACHE_TTL)
    }

    /// Create a registry with an explicit cache TTL.
    pub fn with_cache_ttl(providers: Vec<Arc<dyn ModelProvider>>, cache_ttl: Duration) -> Self {
        Self {
            providers,
            availability_cache: DashMap::new(),
            cache_ttl,
        }
    }

    /// Check if a model is currently available.
    ///
    /// Cached per model id; the underlying provider health probe runs at
    /// most once per TTL window for a given model.
    pub fn is_model_available(&self, model_id: &str) -> bool {
        if model_id.trim().is_empty() {
            return false;
        }

        if let Some(cached) = self.availability_cache.get(model_id) {
            if !cached.is_expired(self.cache_ttl) {
                tracing::trace!(
                    model_id = %model_id,
                    available = cached.available,
                    "availability cache hit"
                );
                return cached.available;
            }
        }

        let available = self.probe_availability(model_id);

        self.availability_cache.insert(
            model_id.to_string(),
            CachedAvailability {
                available,
                cached_at: Instant::now(),
            },
        );

        tracing::debug!(model_id = %model_id, available, "model availability probed");
        available
    }

    /// Get the provider name for a model.
    ///
    /// A `@provider` suffix in the model id wins; otherwise the first
    /// provider advertising the model.
    pub fn provider_for_model(&self, model_id: &str) -> Option<String> {
        if let Some((_, provider)) = model_id.split_once('@') {
            return Some(provider.to_string());
        }

        self.providers
            .iter()
            .find(|p| provider_supports(p.as_ref(), model_id))
            .map(|p| p.name().to_string())
    }

    /// Capabilities of the provider advertising a model, if any.
    pub fn capabilities_for_model(&self, model_id: &str) -> Option<ProviderCapabilities> {
        let base = base_model_id(model_id);
        self.providers
            .iter()
            .find(|p| provider_supports(p.as_ref(), base))
            .map(|p| p.capabilities())
    }

    /// Get model information, or None if no provider advertises it.
    pub fn model_info(&self, model_id: &str) -> Option<ModelInfo> {
        let base = base_model_id(model_id);
        let provider = self
            .providers
            .iter()
            .find(|p| provider_supports(p.as_ref(), base))?;

        Some(ModelInfo {
            model_id: model_id.to_string(),
            provider: provider.name().to_string(),
            is_local: is_local_provider(provider.name()),
            parameter_count: estimate_parameter_count(model_id),
            supports_tool_calling: provider.capabilities().supports_tools,
            is_available: self.is_model_available(model_id),
        })
    }

    /// List all models across all providers, annotated with availability.
    ///
    /// The list is unfiltered: unavailable models appear with
    /// `is_available = false`.
    pub fn list_available_models(&self) -> Vec<ModelInfo> {
        let mut models = Vec::new();

        for provider in &self.providers {
            for model_id in provider.supported_models() {
                if let Some(info) = self.model_info(&model_id) {
                    models.push(info);
                }
            }
        }

        models
    }

    /// Model ids advertised by a named provider (empty if unknown).
    pub fn supported_models(&self, provider_name: &str) -> Vec<String> {
        self.providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(provider_name))
            .map(|p| p.supported_models())
            .unwrap_or_default()
    }

    fn probe_availability(&self, model_id: &str) -> bool {
        let base = base_model_id(model_id);

        for provider in &self.providers {
            if provider_supports(provider.as_ref(), base) {
                // Model is advertised; availability follows provider health
                return provider.is_healthy();
            }
        }

        false
    }
}

/// Strip an optional `@provider` suffix.
fn base_model_id(model_id: &str) -> &str {
    model_id.split('@').next().unwrap_or(model_id)
}

fn provider_supports(provider: &dyn ModelProvider, model_id: &str) -> bool {
    provider
        .supported_models()
        .iter()
        .any(|m| m.eq_ignore_ascii_case(model_id))
}

/// Ollama and vLLM serve models on the local machine.
fn is_local_provider(provider_name: &str) -> bool {
    provider_name.eq_ignore_ascii_case("ollama") || provider_name.eq_ignore_ascii_case("vllm")
}

/// Extract parameter count from the model tag if present (e.g., "llama3.2:70b").
fn estimate_parameter_count(model_id: &str) -> u64 {
    let base = base_model_id(model_id);
    let Some((_, tag)) = base.split_once(':') else {
        return 0;
    };

    let tag = tag.to_lowercase();
    let Some(num_part) = tag.strip_suffix('b') else {
        return 0;
    };

    match num_part.parse::<f64>() {
        Ok(billions) if billions > 0.0 => (billions * 1_000_000_000.0) as u64,
        _ => 0,
    }
}
