//! CORS pass-through proxy for browser clients.
//!
//! Browsers cannot call the upstream API directly, so every request is
//! forwarded with the developer key and user agent added server-side, and
//! answered with permissive CORS headers.

use anyhow::Result;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::fetch::{AUTH_TOKEN_HEADER, HttpClient, upstream_client};

/// How long browsers may cache a preflight answer.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86400);

#[derive(Clone)]
pub struct ProxyState {
    upstream: Arc<dyn HttpClient>,
    base_url: Arc<str>,
}

impl ProxyState {
    pub fn new(upstream: Arc<dyn HttpClient>, base_url: &str) -> Self {
        Self {
            upstream,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }
}

/// CORS policy: the configured origin (`*` for any), GET/POST/OPTIONS, and
/// the two headers browser clients send.
pub fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        AllowOrigin::exact(HeaderValue::from_str(origin)?)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("z-auth-token")])
        .max_age(PREFLIGHT_MAX_AGE))
}

pub fn router(state: ProxyState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(forward)
        .with_state(state)
        .layer(cors)
}

/// Binds `0.0.0.0:<port>` and serves until the process is stopped.
pub async fn serve(config: &Config) -> Result<()> {
    let upstream = upstream_client(&config.api_key, &config.user_agent)?;
    let state = ProxyState::new(Arc::new(upstream), &config.base_url);
    let app = router(state, cors_layer(&config.cors_origin)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        upstream = %config.base_url,
        cors_origin = %config.cors_origin,
        "Proxy listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Forwards the request path (query dropped) to the upstream API and
/// relays status and body.
async fn forward(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let endpoint = uri.path();
    let target = format!("{}{}", state.base_url, endpoint);
    info!(method = %method, endpoint, target = %target, "Proxying request");

    let url = match target.parse() {
        Ok(url) => url,
        Err(e) => return proxy_error(format!("invalid target URL {target}: {e}")),
    };

    let mut req = reqwest::Request::new(method.clone(), url);
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = headers.get(AUTH_TOKEN_HEADER) {
        req.headers_mut().insert(AUTH_TOKEN_HEADER, token.clone());
    }
    if method != Method::GET {
        *req.body_mut() = Some(body.into());
    }

    let upstream = match state.upstream.execute(req).await {
        Ok(resp) => resp,
        Err(e) => return proxy_error(e.to_string()),
    };

    let status = upstream.status();
    match upstream.bytes().await {
        Ok(data) => (
            status,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            data,
        )
            .into_response(),
        Err(e) => proxy_error(e.to_string()),
    }
}

fn proxy_error(message: String) -> Response {
    error!(error = %message, "Proxy error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": message,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
        .into_response()
}
