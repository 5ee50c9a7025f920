use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use key_store::{FileStorage, KeyStore};
use log::{error, info};
use playground_llm::ConnectorRegistry;

use crate::controllers::{chat_controller, key_controller, ollama_proxy_controller};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

pub struct AppState {
    pub registry: Arc<ConnectorRegistry>,
    pub store: Arc<KeyStore>,
    /// Shared client for the Ollama proxy.
    pub http: reqwest::Client,
    pub ollama_base_url: String,
}

impl AppState {
    pub fn new(registry: Arc<ConnectorRegistry>, store: Arc<KeyStore>) -> Self {
        let ollama_base_url = std::env::var("OLLAMA_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OLLAMA_BASE_URL.to_string());
        Self {
            registry,
            store,
            http: reqwest::Client::new(),
            ollama_base_url,
        }
    }

    pub fn with_ollama_base_url(mut self, url: impl Into<String>) -> Self {
        self.ollama_base_url = url.into();
        self
    }
}

pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(chat_controller::config)
            .configure(key_controller::config)
            .configure(ollama_proxy_controller::config),
    );
}

pub async fn run(bind_addr: &str) -> Result<(), String> {
    info!("Starting playground server...");

    let registry = Arc::new(ConnectorRegistry::new());
    let store = Arc::new(KeyStore::new(
        Arc::clone(&registry),
        Arc::new(FileStorage::new()),
    ));
    store.initialize_keyless_providers().await;

    let app_state = web::Data::new(AppState::new(registry, store));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Cors::permissive())
            .configure(app_config)
    })
    .bind(bind_addr)
    .map_err(|e| format!("Failed to bind {bind_addr}: {e}"))?
    .run();

    info!("Playground server listening on http://{bind_addr}");

    if let Err(e) = server.await {
        error!("Server error: {e}");
        return Err(format!("Server error: {e}"));
    }

    Ok(())
}
