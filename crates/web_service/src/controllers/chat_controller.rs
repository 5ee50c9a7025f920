use actix_web::{get, post, web, HttpResponse};
use bytes::Bytes;
use futures_util::StreamExt;
use playground_llm::ChatReply;

use crate::dto::{ChatRequest, ChatResponse};
use crate::error::AppError;
use crate::server::AppState;

/// Run one chat turn against the requested provider.
///
/// Streaming responses are relayed as plain text chunks in provider
/// order; buffered responses come back as a single JSON body.
#[post("/chat")]
pub async fn chat(
    app_state: web::Data<AppState>,
    req: web::Json<ChatRequest>,
) -> Result<HttpResponse, AppError> {
    let (provider, messages, config, stream) = req.into_inner().into_parts()?;

    let key = app_state.store.get_key(provider).await.unwrap_or_default();
    let connector = app_state.registry.get(provider);

    log::debug!("chat request for {provider} model {}", config.model);
    let reply = connector.chat(&messages, &config, &key, stream).await?;

    match reply {
        ChatReply::Complete(content) => Ok(HttpResponse::Ok().json(ChatResponse { content })),
        ChatReply::Stream(fragments) => {
            let body = fragments.map(|item| item.map(Bytes::from).map_err(AppError::from));
            Ok(HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .streaming(body))
        }
    }
}

/// Models discovered by the most recent connection tests.
#[get("/models")]
pub async fn models(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(app_state.store.available_models().await))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(chat).service(models);
}
