//! Dynamically discovered model descriptors and credential status.

use serde::{Deserialize, Serialize};

use crate::providers::ProviderId;

/// Cap on the number of dynamically discovered models kept per provider.
pub const MAX_DYNAMIC_MODELS: usize = 10;

/// A model reported by a provider's model-listing call.
///
/// Ephemeral: never persisted, recomputed on each successful connection
/// test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Provider-specific model identifier.
    pub id: String,
    /// Human-readable label.
    pub name: String,
    pub provider: ProviderId,
    /// Context window size, in tokens.
    pub context_window: u32,
    pub description: String,
    pub available: bool,
}

/// Validation state of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    #[default]
    Untested,
    Valid,
    Invalid,
    Error,
}
