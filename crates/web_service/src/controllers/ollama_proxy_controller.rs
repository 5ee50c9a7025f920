//! Transparent proxy in front of the local Ollama daemon.
//!
//! Browsers cannot call `http://localhost:11434` directly from a served
//! page, so the UI talks to `/api/ollama/*` and this controller forwards
//! the request verbatim, streaming the response body back as it arrives.

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;
use reqwest::Method;

use crate::error::AppError;
use crate::server::AppState;

async fn forward(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let method = match *req.method() {
        actix_web::http::Method::GET => Method::GET,
        actix_web::http::Method::POST => Method::POST,
        actix_web::http::Method::DELETE => Method::DELETE,
        _ => {
            return Err(AppError::InvalidRequest(format!(
                "method {} not supported by the Ollama proxy",
                req.method()
            )))
        }
    };

    let url = format!("{}/{}", app_state.ollama_base_url, path.as_str());
    log::debug!("proxying {method} {url}");

    let mut upstream = app_state.http.request(method, &url);
    if let Some(content_type) = req.headers().get(actix_web::http::header::CONTENT_TYPE) {
        if let Ok(value) = content_type.to_str() {
            upstream = upstream.header(reqwest::header::CONTENT_TYPE, value);
        }
    }
    if !body.is_empty() {
        upstream = upstream.body(body.to_vec());
    }

    let response = upstream.send().await.map_err(|err| {
        log::warn!("Ollama proxy request failed: {err}");
        AppError::OllamaUnreachable
    })?;

    let status = StatusCode::from_u16(response.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = HttpResponse::build(status);
    if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE) {
        if let Ok(value) = content_type.to_str() {
            builder.content_type(value);
        }
    }

    // Body is relayed chunk by chunk so NDJSON token streams reach the
    // client as they are produced.
    Ok(builder.streaming(
        response
            .bytes_stream()
            .map_err(|err| AppError::Connector(err.into())),
    ))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/ollama/{path:.*}")
            .route(web::get().to(forward))
            .route(web::post().to(forward))
            .route(web::delete().to(forward)),
    );
}
