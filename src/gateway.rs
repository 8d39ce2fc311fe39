//! Server-side proxy boundary in front of the HRIS and payment upstreams.
//!
//! Browsers and CLI callers talk to `/equipment`; the gateway injects the
//! bearer tokens, so they never leave this process. Responses are relayed
//! with the upstream's status and a JSON body, and are never cacheable.
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Error;

static TRAILING_SLASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"/+$").expect("valid regex"));

/// Which configured upstream a proxied call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    Hris,
    Post,
}

impl UpstreamKind {
    fn label(self) -> &'static str {
        match self {
            UpstreamKind::Hris => "HRIS",
            UpstreamKind::Post => "POST",
        }
    }
}

/// Shared handler context: configuration plus one reqwest client reused
/// across proxied calls.
#[derive(Clone)]
pub struct GatewayState {
    cfg: Arc<Config>,
    http: reqwest::Client,
}

impl GatewayState {
    pub fn new(cfg: Arc<Config>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("equipment-portal/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self { cfg, http }
    }
}

/// Build the gateway router: `GET /equipment` and `POST /equipment`.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/equipment", get(proxy_get).post(proxy_post))
        .with_state(state)
}

async fn proxy_get(State(state): State<GatewayState>) -> Response {
    info!("equipment GET received");
    match call_upstream(&state, Method::GET, None, UpstreamKind::Hris).await {
        Ok(response) => response,
        Err(err) => {
            error!(%err, "equipment GET rejected");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": err.to_string(),
                    "message": "GET request failed - this can help test if the upstream service is accessible",
                }),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProxyParams {
    api: Option<String>,
}

async fn proxy_post(
    State(state): State<GatewayState>,
    params: Option<Query<ProxyParams>>,
    body: Bytes,
) -> Response {
    let api = params.and_then(|Query(p)| p.api);
    // Only an explicit `?api=post` selects the payment upstream.
    let kind = match api.as_deref() {
        Some("post") => UpstreamKind::Post,
        _ => UpstreamKind::Hris,
    };
    info!(api = kind.label(), "equipment POST received");

    let text = String::from_utf8_lossy(&body);
    let body = if text.trim().is_empty() {
        json!({})
    } else {
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Null) => json!({}),
            Ok(value) => value,
            Err(err) => {
                error!(%err, "equipment POST body is not valid JSON");
                return json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": err.to_string() }),
                );
            }
        }
    };

    match call_upstream(&state, Method::POST, Some(body), kind).await {
        Ok(response) => response,
        Err(err) => {
            error!(%err, "equipment POST rejected");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            )
        }
    }
}

async fn call_upstream(
    state: &GatewayState,
    method: Method,
    body: Option<Value>,
    kind: UpstreamKind,
) -> Result<Response, Error> {
    require_config(&state.cfg)?;

    let upstream = match kind {
        UpstreamKind::Hris => &state.cfg.hris,
        UpstreamKind::Post => &state.cfg.post,
    };
    let url = upstream_url(&upstream.base_url);
    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        method = %method,
        api = kind.label(),
        %url,
        token = %token_preview(&upstream.token),
        "proxying to upstream"
    );

    let mut request = state
        .http
        .request(method.clone(), &url)
        .header("Content-Type", "application/json")
        .header("Accept", "application/json")
        .header("Authorization", format!("Bearer {}", upstream.token));
    if method == Method::POST {
        request = request.json(&body.unwrap_or_else(|| json!({})));
    }

    let res = match request.send().await {
        Ok(res) => res,
        Err(err) => return Ok(network_error_response(kind, request_id, &err.to_string())),
    };

    let status = res.status().as_u16();
    let status_text = res
        .status()
        .canonical_reason()
        .unwrap_or_default()
        .to_string();
    let text = match res.text().await {
        Ok(text) => text,
        Err(err) => return Ok(network_error_response(kind, request_id, &err.to_string())),
    };
    let data = parse_upstream_body(&text);

    if !(200..300).contains(&status) {
        error!(
            %request_id,
            api = kind.label(),
            status,
            status_text = %status_text,
            body = %data,
            "upstream request failed"
        );
        if status == 500 {
            error!(
                %request_id,
                api = kind.label(),
                %url,
                "upstream returned an internal server error; check that the service is running and the URL is correct"
            );
        }
        let relay_status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        return Ok(json_response(
            relay_status,
            upstream_failure_body(kind, status, &status_text, data),
        ));
    }

    debug!(%request_id, api = kind.label(), status, "upstream request succeeded");
    let relay_status = if method == Method::POST {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(json_response(relay_status, data))
}

/// Both upstream pairs must be configured before any call is served, even
/// though each call uses only one of them.
fn require_config(cfg: &Config) -> Result<(), Error> {
    debug!(
        has_hris_base_url = !cfg.hris.base_url.is_empty(),
        has_hris_token = !cfg.hris.token.is_empty(),
        has_post_base_url = !cfg.post.base_url.is_empty(),
        has_post_token = !cfg.post.token.is_empty(),
        "configuration check"
    );
    if !cfg.hris.is_configured() {
        return Err(Error::config(
            "Server configuration error: Missing HRIS_API_URL or HRIS_BEARER_TOKEN environment variables.",
        ));
    }
    if !cfg.post.is_configured() {
        return Err(Error::config(
            "Server configuration error: Missing POST_API_URL or POST_BEARER_TOKEN environment variables.",
        ));
    }
    Ok(())
}

/// Strip trailing slashes so later joins never produce double slashes.
fn upstream_url(base: &str) -> String {
    TRAILING_SLASHES.replace(base, "").into_owned()
}

/// Bounded token prefix for operator logs. The full value never appears in
/// any log line or response body.
fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(10).collect();
    format!("{prefix}...")
}

/// Upstream bodies are relayed as JSON; non-JSON text is wrapped so callers
/// still get an object to inspect.
fn parse_upstream_body(text: &str) -> Value {
    if text.is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "rawResponse": text }))
}

/// Error body relayed when the upstream answered with a non-success status.
/// Only a 500 carries the extra `upstreamError` hint.
fn upstream_failure_body(
    kind: UpstreamKind,
    status: u16,
    status_text: &str,
    details: Value,
) -> Value {
    let mut body = json!({
        "error": "Failed request to upstream service.",
        "statusCode": status,
        "statusText": status_text,
        "details": details,
    });
    if status == 500 {
        body["upstreamError"] = json!(format!(
            "The {} API server returned an internal server error. Please check if the service is running and accessible.",
            kind.label()
        ));
    }
    body
}

fn network_error_response(kind: UpstreamKind, request_id: Uuid, detail: &str) -> Response {
    error!(%request_id, api = kind.label(), %detail, "network error reaching upstream");
    json_response(
        StatusCode::BAD_GATEWAY,
        json!({
            "error": "Network error connecting to upstream service.",
            "details": detail,
            "upstreamError": format!(
                "Unable to connect to the {} API server. Please check the URL and network connectivity.",
                kind.label()
            ),
        }),
    )
}

fn json_response(status: StatusCode, body: Value) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
