//! HTTP surface tests against mocked provider backends.

use std::sync::Arc;

use actix_web::{test, web, App};
use chat_core::ProviderId;
use key_store::{KeyStore, MemoryStorage};
use playground_llm::{Connector, ConnectorRegistry, OllamaConnector, OpenAiConnector};
use serde_json::{json, Value};
use web_service::server::{app_config, AppState};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai_key() -> String {
    format!("sk-{}", "x".repeat(20))
}

/// App state wired to a mock server for both the OpenAI connector and
/// the Ollama proxy.
fn state_for(mock_uri: &str) -> web::Data<AppState> {
    let openai: Arc<dyn Connector> =
        Arc::new(OpenAiConnector::new().with_base_url(mock_uri.to_string()));
    let ollama: Arc<dyn Connector> =
        Arc::new(OllamaConnector::new().with_base_url(mock_uri.to_string()));
    let registry = Arc::new(ConnectorRegistry::new().with(openai).with(ollama));
    let store = Arc::new(KeyStore::new(
        Arc::clone(&registry),
        Arc::new(MemoryStorage::new()),
    ));
    web::Data::new(AppState::new(registry, store).with_ollama_base_url(mock_uri.to_string()))
}

#[actix_web::test]
async fn chat_rejects_out_of_range_temperature_before_any_network_call() {
    let state = state_for("http://127.0.0.1:1");
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({
            "provider": "openai",
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "Hi" }],
            "temperature": 2.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "invalid_request");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("temperature"));
}

#[actix_web::test]
async fn chat_without_a_configured_key_is_a_client_error() {
    let state = state_for("http://127.0.0.1:1");
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({
            "provider": "openai",
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "Hi" }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "OpenAI API key is not configured");
}

#[actix_web::test]
async fn chat_streams_text_fragments_in_order() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse))
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    state.store.set_key(ProviderId::OpenAi, &openai_key()).await;
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({
            "provider": "openai",
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "Hi" }],
            "stream": true
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
    let body = test::read_body(resp).await;
    assert_eq!(body, "Hello world".as_bytes());
}

#[actix_web::test]
async fn chat_buffered_returns_json_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Buffered" } }]
        })))
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    state.store.set_key(ProviderId::OpenAi, &openai_key()).await;
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({
            "provider": "openai",
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "Hi" }],
            "stream": false
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["content"], "Buffered");
}

#[actix_web::test]
async fn provider_error_message_is_relayed_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "rate limited" }
        })))
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    state.store.set_key(ProviderId::OpenAi, &openai_key()).await;
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let req = test::TestRequest::post()
        .uri("/api/chat")
        .set_json(json!({
            "provider": "openai",
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "Hi" }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 502);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "rate limited");
    assert_eq!(body["error"]["type"], "api_error");
}

#[actix_web::test]
async fn key_states_never_expose_the_secret() {
    let state = state_for("http://127.0.0.1:1");
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let set = test::TestRequest::post()
        .uri("/api/keys")
        .set_json(json!({ "provider": "openai", "key": openai_key() }))
        .to_request();
    let set_body: Value = test::call_and_read_body_json(&app, set).await;
    assert_eq!(set_body["configured"], true);
    assert_eq!(set_body["status"], "untested");

    let list = test::TestRequest::get().uri("/api/keys").to_request();
    let resp = test::call_service(&app, list).await;
    let raw = test::read_body(resp).await;
    let raw = String::from_utf8(raw.to_vec()).unwrap();
    assert!(!raw.contains(&openai_key()));

    let states: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(states[0]["provider"], "openai");
    assert_eq!(states[0]["masked_key"], "sk-xxxx••••xxxx");
}

#[actix_web::test]
async fn removing_a_key_resets_its_state() {
    let state = state_for("http://127.0.0.1:1");
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let set = test::TestRequest::post()
        .uri("/api/keys")
        .set_json(json!({ "provider": "openai", "key": openai_key() }))
        .to_request();
    test::call_service(&app, set).await;

    let remove = test::TestRequest::delete()
        .uri("/api/keys/openai")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, remove).await;
    assert_eq!(body["configured"], false);
    assert_eq!(body["status"], "untested");
}

#[actix_web::test]
async fn unknown_provider_in_path_is_rejected() {
    let state = state_for("http://127.0.0.1:1");
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let req = test::TestRequest::delete()
        .uri("/api/keys/mistral")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_key_endpoint_reports_valid_with_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "gpt-4o", "created": 2 },
                { "id": "gpt-4o-mini", "created": 1 }
            ]
        })))
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let set = test::TestRequest::post()
        .uri("/api/keys")
        .set_json(json!({ "provider": "openai", "key": openai_key() }))
        .to_request();
    test::call_service(&app, set).await;

    let req = test::TestRequest::post()
        .uri("/api/keys/openai/test")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "valid");
    assert_eq!(body["models"].as_array().unwrap().len(), 2);

    let models = test::TestRequest::get().uri("/api/models").to_request();
    let models: Value = test::call_and_read_body_json(&app, models).await;
    assert_eq!(models.as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn ollama_proxy_passes_responses_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{ "name": "llama3.2:latest" }]
        })))
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let req = test::TestRequest::get()
        .uri("/api/ollama/api/tags")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["models"][0]["name"], "llama3.2:latest");
}

#[actix_web::test]
async fn ollama_proxy_preserves_upstream_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let state = state_for(&server.uri());
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let req = test::TestRequest::post()
        .uri("/api/ollama/api/chat")
        .set_json(json!({ "model": "missing" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
    let body = test::read_body(resp).await;
    assert_eq!(body, "model not found".as_bytes());
}

#[actix_web::test]
async fn ollama_proxy_maps_connection_failure_to_service_unavailable() {
    let state = state_for("http://127.0.0.1:1");
    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;

    let req = test::TestRequest::get()
        .uri("/api/ollama/api/tags")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 503);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"]["message"],
        "Failed to connect to Ollama. Is the service running?"
    );
}
