//! In-memory key registry with persisted snapshots.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chat_core::{mask_key, KeyStatus, ModelInfo, ProviderId};
use chrono::{DateTime, Utc};
use playground_llm::ConnectorRegistry;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::obfuscate::{deobfuscate, obfuscate};
use crate::storage::SnapshotStorage;

/// Name of the persisted snapshot.
pub const STORAGE_KEY: &str = "genai-playground-api-keys";

#[derive(Debug, Clone, Default)]
struct ProviderRecord {
    secret: String,
    configured: bool,
    status: KeyStatus,
    error_message: Option<String>,
    last_tested: Option<DateTime<Utc>>,
    // Refreshed on every successful connection test; never persisted.
    models: Vec<ModelInfo>,
}

/// On-disk shape of one provider entry. The secret is stored obfuscated;
/// cached model lists are deliberately left out and re-fetched on the
/// next connection test.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedRecord {
    key: String,
    configured: bool,
    status: KeyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_tested: Option<DateTime<Utc>>,
}

/// Point-in-time view of one provider's credential, safe to hand to
/// callers because it never carries the secret itself.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderKeyState {
    pub provider: ProviderId,
    pub configured: bool,
    pub status: KeyStatus,
    /// Masked preview of the stored secret, for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tested: Option<DateTime<Utc>>,
}

/// Result of a connection test.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub provider: ProviderId,
    pub status: KeyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub models: Vec<ModelInfo>,
}

/// Holds provider credentials for the lifetime of the process.
///
/// Mutations persist a snapshot immediately, so a crash never loses more
/// than the in-flight change.
pub struct KeyStore {
    registry: Arc<ConnectorRegistry>,
    storage: Arc<dyn SnapshotStorage>,
    records: RwLock<HashMap<ProviderId, ProviderRecord>>,
    keyless_initialized: AtomicBool,
}

impl KeyStore {
    pub fn new(registry: Arc<ConnectorRegistry>, storage: Arc<dyn SnapshotStorage>) -> Self {
        let records = load_snapshot(storage.as_ref());
        Self {
            registry,
            storage,
            records: RwLock::new(records),
            keyless_initialized: AtomicBool::new(false),
        }
    }

    /// Store a key for a provider. Whitespace is trimmed; an empty key
    /// removes the entry entirely. A key that fails the provider's format
    /// predicate is kept but marked invalid immediately, without any
    /// network call.
    pub async fn set_key(&self, provider: ProviderId, key: &str) {
        let key = key.trim();
        {
            let mut records = self.records.write().await;
            if key.is_empty() {
                records.remove(&provider);
            } else if !provider.is_valid_key_format(key) {
                records.insert(
                    provider,
                    ProviderRecord {
                        secret: key.to_string(),
                        configured: true,
                        status: KeyStatus::Invalid,
                        error_message: Some("Invalid key format".to_string()),
                        ..ProviderRecord::default()
                    },
                );
            } else {
                records.insert(
                    provider,
                    ProviderRecord {
                        secret: key.to_string(),
                        configured: true,
                        ..ProviderRecord::default()
                    },
                );
            }
            self.persist(&records);
        }
    }

    pub async fn remove_key(&self, provider: ProviderId) {
        self.set_key(provider, "").await;
    }

    pub async fn get_key(&self, provider: ProviderId) -> Option<String> {
        let records = self.records.read().await;
        records
            .get(&provider)
            .filter(|record| record.configured)
            .map(|record| record.secret.clone())
    }

    pub async fn is_key_configured(&self, provider: ProviderId) -> bool {
        let records = self.records.read().await;
        records.get(&provider).is_some_and(|record| record.configured)
    }

    pub async fn is_any_key_configured(&self) -> bool {
        let records = self.records.read().await;
        records.values().any(|record| record.configured)
    }

    pub async fn state(&self, provider: ProviderId) -> ProviderKeyState {
        let records = self.records.read().await;
        let record = records.get(&provider).cloned().unwrap_or_default();
        state_view(provider, &record)
    }

    pub async fn states(&self) -> Vec<ProviderKeyState> {
        let records = self.records.read().await;
        ProviderId::ALL
            .into_iter()
            .map(|provider| {
                let record = records.get(&provider).cloned().unwrap_or_default();
                state_view(provider, &record)
            })
            .collect()
    }

    /// Register keyless providers as configured and probe each of them
    /// once, so a local always-on service becomes available without user
    /// action. Runs at most once per store.
    pub async fn initialize_keyless_providers(&self) {
        if self.keyless_initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        let keyless: Vec<ProviderId> = {
            let mut records = self.records.write().await;
            let mut keyless = Vec::new();
            for provider in ProviderId::ALL {
                if provider.descriptor().requires_key {
                    continue;
                }
                records.entry(provider).or_insert_with(|| ProviderRecord {
                    configured: true,
                    ..ProviderRecord::default()
                });
                keyless.push(provider);
            }
            self.persist(&records);
            keyless
        };

        futures::future::join_all(
            keyless
                .into_iter()
                .map(|provider| self.test_connection(provider)),
        )
        .await;
    }

    /// Validate a provider's credential end to end: format check, then a
    /// live auth probe, then a model listing on success.
    ///
    /// Status transitions: a malformed key goes to `invalid` ("Invalid key
    /// format"); a rejected probe goes to `error` ("Invalid API key" for
    /// credentialed providers, "Service not available" for keyless ones);
    /// a successful probe goes to `valid` with a fresh model list.
    pub async fn test_connection(&self, provider: ProviderId) -> TestOutcome {
        let requires_key = provider.descriptor().requires_key;
        let key = self.get_key(provider).await.unwrap_or_default();

        if requires_key && !provider.is_valid_key_format(&key) {
            return self
                .record_outcome(provider, KeyStatus::Invalid, Some("Invalid key format"), Vec::new())
                .await;
        }

        // Mark the probe as in flight, clearing any stale error.
        {
            let mut records = self.records.write().await;
            let record = records.entry(provider).or_default();
            record.status = KeyStatus::Untested;
            record.error_message = None;
        }

        let connector = self.registry.get(provider);
        if !connector.validate_key(&key).await {
            let message = if requires_key {
                "Invalid API key"
            } else {
                "Service not available"
            };
            return self
                .record_outcome(provider, KeyStatus::Error, Some(message), Vec::new())
                .await;
        }

        let models = connector.list_models(&key).await;
        self.record_outcome(provider, KeyStatus::Valid, None, models)
            .await
    }

    /// Test every configured provider concurrently.
    pub async fn test_all_connections(&self) -> Vec<TestOutcome> {
        self.initialize_keyless_providers().await;
        let providers: Vec<ProviderId> = {
            let records = self.records.read().await;
            ProviderId::ALL
                .into_iter()
                .filter(|provider| {
                    records.get(provider).is_some_and(|record| record.configured)
                })
                .collect()
        };

        futures::future::join_all(
            providers
                .into_iter()
                .map(|provider| self.test_connection(provider)),
        )
        .await
    }

    /// Models discovered by the last successful test, across all
    /// providers currently in the `valid` state.
    pub async fn available_models(&self) -> Vec<ModelInfo> {
        let records = self.records.read().await;
        ProviderId::ALL
            .into_iter()
            .filter_map(|provider| records.get(&provider))
            .filter(|record| record.status == KeyStatus::Valid)
            .flat_map(|record| record.models.iter().cloned())
            .collect()
    }

    pub async fn models_for(&self, provider: ProviderId) -> Vec<ModelInfo> {
        let records = self.records.read().await;
        records
            .get(&provider)
            .map(|record| record.models.clone())
            .unwrap_or_default()
    }

    pub async fn clear_all(&self) {
        let mut records = self.records.write().await;
        records.clear();
        self.persist(&records);
    }

    async fn record_outcome(
        &self,
        provider: ProviderId,
        status: KeyStatus,
        message: Option<&str>,
        models: Vec<ModelInfo>,
    ) -> TestOutcome {
        {
            let mut records = self.records.write().await;
            let record = records.entry(provider).or_default();
            record.status = status;
            record.error_message = message.map(str::to_string);
            record.last_tested = Some(Utc::now());
            record.models = models.clone();
            self.persist(&records);
        }
        TestOutcome {
            provider,
            status,
            message: message.map(str::to_string),
            models,
        }
    }

    fn persist(&self, records: &HashMap<ProviderId, ProviderRecord>) {
        let snapshot: HashMap<&str, PersistedRecord> = records
            .iter()
            .map(|(provider, record)| {
                (
                    provider.as_str(),
                    PersistedRecord {
                        key: obfuscate(&record.secret),
                        configured: record.configured,
                        status: record.status,
                        error_message: record.error_message.clone(),
                        last_tested: record.last_tested,
                    },
                )
            })
            .collect();

        match serde_json::to_string(&snapshot) {
            Ok(serialized) => {
                if let Err(err) = self.storage.store(&serialized) {
                    log::warn!("Failed to persist key snapshot: {err}");
                }
            }
            Err(err) => log::warn!("Failed to serialize key snapshot: {err}"),
        }
    }
}

fn state_view(provider: ProviderId, record: &ProviderRecord) -> ProviderKeyState {
    let masked_key = if record.configured && !record.secret.is_empty() {
        Some(mask_key(&record.secret))
    } else {
        None
    };
    ProviderKeyState {
        provider,
        configured: record.configured,
        status: record.status,
        masked_key,
        error_message: record.error_message.clone(),
        last_tested: record.last_tested,
    }
}

fn load_snapshot(storage: &dyn SnapshotStorage) -> HashMap<ProviderId, ProviderRecord> {
    let Some(raw) = storage.load() else {
        return HashMap::new();
    };

    let parsed: HashMap<String, PersistedRecord> = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            log::warn!("Discarding unreadable key snapshot: {err}");
            return HashMap::new();
        }
    };

    parsed
        .into_iter()
        .filter_map(|(name, record)| {
            let provider: ProviderId = name.parse().ok()?;
            let secret = deobfuscate(&record.key)?;
            Some((
                provider,
                ProviderRecord {
                    secret,
                    configured: record.configured,
                    status: record.status,
                    error_message: record.error_message,
                    last_tested: record.last_tested,
                    models: Vec::new(),
                },
            ))
        })
        .collect()
}
