//! Provider seam consumed by the model registry.

use serde::{Deserialize, Serialize};

/// Capabilities a provider advertises for the models it serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Whether models support function/tool calling
    pub supports_tools: bool,
    /// Whether models support vision/image inputs
    pub supports_vision: bool,
    /// Whether models support JSON mode
    pub supports_json_mode: bool,
}

/// An inference backend able to serve a set of models.
///
/// Concrete clients (Ollama, vLLM, remote APIs) live outside this crate;
/// the routing core only needs the advertised model list and a bounded
/// health probe. Implementations are expected to enforce their own probe
/// timeout so `is_healthy` never blocks a routing decision indefinitely.
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "ollama", "vllm", "openai")
    fn name(&self) -> &str;

    /// Model ids this provider advertises
    fn supported_models(&self) -> Vec<String>;

    /// Capabilities of this provider's models
    fn capabilities(&self) -> ProviderCapabilities;

    /// Whether the provider can currently serve requests
    fn is_healthy(&self) -> bool;
}

/// Availability-annotated model listing entry.
///
/// Safe to serialize for status output; carries no live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    pub provider: String,
    pub is_local: bool,
    /// Estimated from the model tag (e.g., "llama3.2:70b" -> 70B); 0 if unknown
    pub parameter_count: u64,
    pub supports_tool_calling: bool,
    pub is_available: bool,
}
