//! chat_core - Shared types for the GenAI playground
//!
//! This crate provides the foundational types used across the playground
//! crates:
//! - `providers` - the closed provider set and its static metadata
//! - `message` - chat messages and roles
//! - `config` - per-request sampling configuration
//! - `model` - dynamically discovered model descriptors

pub mod config;
pub mod message;
pub mod model;
pub mod providers;

// Re-export commonly used types
pub use config::ModelConfig;
pub use message::{ChatMessage, Role};
pub use model::{KeyStatus, ModelInfo, MAX_DYNAMIC_MODELS};
pub use providers::{mask_key, ProviderDescriptor, ProviderId, UnknownProviderError};
