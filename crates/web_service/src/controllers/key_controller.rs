use actix_web::{delete, get, post, web, HttpResponse};
use chat_core::ProviderId;

use crate::dto::SetKeyRequest;
use crate::error::AppError;
use crate::server::AppState;

fn parse_provider(raw: &str) -> Result<ProviderId, AppError> {
    raw.parse()
        .map_err(|_| AppError::InvalidRequest(format!("unknown provider: {raw}")))
}

/// Credential state of every provider. Secrets never leave the store.
#[get("/keys")]
pub async fn list_states(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(app_state.store.states().await))
}

#[post("/keys")]
pub async fn set_key(
    app_state: web::Data<AppState>,
    req: web::Json<SetKeyRequest>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    app_state.store.set_key(req.provider, &req.key).await;
    Ok(HttpResponse::Ok().json(app_state.store.state(req.provider).await))
}

#[delete("/keys/{provider}")]
pub async fn remove_key(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let provider = parse_provider(&path)?;
    app_state.store.remove_key(provider).await;
    Ok(HttpResponse::Ok().json(app_state.store.state(provider).await))
}

/// Validate one provider's credential against the live service.
#[post("/keys/{provider}/test")]
pub async fn test_key(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let provider = parse_provider(&path)?;
    Ok(HttpResponse::Ok().json(app_state.store.test_connection(provider).await))
}

/// Test every configured provider concurrently.
#[post("/keys/test")]
pub async fn test_all(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(app_state.store.test_all_connections().await))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(list_states)
        .service(set_key)
        .service(test_all)
        .service(test_key)
        .service(remove_key);
}
