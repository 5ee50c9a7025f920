//! Credential store for provider API keys.
//!
//! Keys live in memory as plaintext for the lifetime of the process and
//! are persisted obfuscated (base64) between runs. Obfuscation is not
//! encryption; it only keeps the raw key out of casual view of the
//! snapshot file.

mod obfuscate;
mod storage;
mod store;

pub use storage::{FileStorage, MemoryStorage, SnapshotStorage};
pub use store::{KeyStore, ProviderKeyState, TestOutcome, STORAGE_KEY};
