use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::app::AppState;

const PATH_PARAM: &str = "path";

/// `GET /api/tmdb?path=<logical path>&<params…>`
///
/// Relays the upstream JSON and status. The credential never leaves the server.
pub async fn proxy_tmdb(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> (StatusCode, Json<Value>) {
    let (path, params) = split_path(query);

    let Some(path) = path else {
        warn!("Rejecting proxy request without path");
        return message(StatusCode::BAD_REQUEST, "API path is required");
    };

    let Some(api_key) = state.tmdb_api_key.as_deref() else {
        error!("TMDB_API_KEY is not configured; refusing to proxy {}", path);
        return message(StatusCode::INTERNAL_SERVER_ERROR, "API key is not configured");
    };

    match state.tmdb.get(api_key, &path, &params).await {
        Ok(reply) if reply.status.is_success() => {
            debug!(path = %path, status = %reply.status, "Proxied TMDB request");
            (StatusCode::OK, Json(reply.body))
        }
        Ok(reply) => {
            warn!(path = %path, status = %reply.status, "TMDB returned an error");
            (reply.status, Json(reply.body))
        }
        Err(e) => {
            error!("Proxy API error for {}: {:#}", path, e);
            message(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// Separates the logical path from the params forwarded upstream, keeping
/// the caller's order.
fn split_path(query: Vec<(String, String)>) -> (Option<String>, Vec<(String, String)>) {
    let mut path = None;
    let mut params = Vec::with_capacity(query.len());
    for (key, value) in query {
        if key == PATH_PARAM {
            let trimmed = value.trim().trim_matches('/');
            if !trimmed.is_empty() && path.is_none() {
                path = Some(trimmed.to_string());
            }
        } else {
            params.push((key, value));
        }
    }
    (path, params)
}

fn message(status: StatusCode, text: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": text })))
}
