//! HTTP proxy in front of the upstream visa-requirements API.
//!
//! `GET /visa-status/{code}` validates the passport code, asks upstream,
//! flattens the answer into a [`VisaTable`] and falls back to built-in data
//! when upstream is down. CORS preflight is answered for browser callers.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::codes::{Iso2Code, parse_iso2};
use crate::fallback::fallback_table;
use crate::visa::{UpstreamDocument, VisaTable};

pub const DEFAULT_UPSTREAM_URL: &str = "https://rough-sun-2523.fly.dev";

const LIVE_CACHE: &str = "public, max-age=3600";
const FALLBACK_CACHE: &str = "public, max-age=300";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub addr: SocketAddr,
    pub upstream_url: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct ProxyState {
    upstream_url: String,
    http: reqwest::Client,
}

impl ProxyState {
    pub fn new(upstream_url: impl Into<String>, timeout: Duration) -> Result<Self, ProxyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("VisaMapApp/1.0")
            .build()?;
        Ok(Self {
            upstream_url: upstream_url.into(),
            http,
        })
    }
}

/// Result of one status lookup, before it becomes an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    InvalidCode(String),
    Live(VisaTable),
    /// Upstream failed with 5xx or did not answer.
    Fallback(VisaTable),
    /// Upstream refused the request (4xx); passed through.
    Upstream(u16),
}

pub async fn lookup(state: &ProxyState, raw_code: &str) -> Lookup {
    let Some(code) = parse_iso2(raw_code) else {
        return Lookup::InvalidCode(raw_code.to_string());
    };
    let url = format!("{}/country/{code}", state.upstream_url.trim_end_matches('/'));

    let resp = match state
        .http
        .get(&url)
        .header(header::ACCEPT, "application/json")
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(err) => {
            error!("visa upstream GET failed for {code}: {err}");
            return fallback(&code);
        }
    };

    let status = resp.status();
    if status.is_server_error() {
        warn!("visa upstream returned {status} for {code}, serving fallback data");
        return fallback(&code);
    }
    if !status.is_success() {
        return Lookup::Upstream(status.as_u16());
    }

    match resp.json::<UpstreamDocument>().await {
        Ok(doc) => Lookup::Live(VisaTable::from_upstream(doc)),
        Err(err) => {
            error!("visa upstream body unreadable for {code}: {err}");
            fallback(&code)
        }
    }
}

fn fallback(code: &Iso2Code) -> Lookup {
    Lookup::Fallback(fallback_table(code))
}

impl IntoResponse for Lookup {
    fn into_response(self) -> Response {
        match self {
            Lookup::InvalidCode(code) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("invalid country code: {code:?}") })),
            )
                .into_response(),
            Lookup::Live(table) => {
                ([(header::CACHE_CONTROL, HeaderValue::from_static(LIVE_CACHE))], Json(table)).into_response()
            }
            Lookup::Fallback(table) => (
                [(header::CACHE_CONTROL, HeaderValue::from_static(FALLBACK_CACHE))],
                Json(table),
            )
                .into_response(),
            Lookup::Upstream(status) => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, Json(json!({ "error": format!("upstream error: {status}") }))).into_response()
            }
        }
    }
}

async fn visa_status(State(state): State<ProxyState>, Path(code): Path<String>) -> Response {
    lookup(&state, &code).await.into_response()
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

pub fn router(state: ProxyState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/visa-status/:code", get(visa_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: ProxyConfig) -> Result<(), ProxyError> {
    let state = ProxyState::new(config.upstream_url.clone(), config.timeout)?;
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|source| ProxyError::Bind {
            addr: config.addr,
            source,
        })?;

    info!(upstream = %config.upstream_url, "visa proxy listening on http://{}", config.addr);
    axum::serve(listener, router(state))
        .await
        .map_err(ProxyError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visa::VisaStatus;

    fn unreachable_state() -> ProxyState {
        ProxyState::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap()
    }

    #[tokio::test]
    async fn invalid_code_never_reaches_upstream() {
        let lookup = lookup(&unreachable_state(), "FRA").await;
        assert_eq!(lookup, Lookup::InvalidCode("FRA".into()));
        assert_eq!(lookup.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn network_error_serves_fallback() {
        match lookup(&unreachable_state(), "ru").await {
            Lookup::Fallback(table) => {
                assert_eq!(table.get(&Iso2Code::new("TH")), Some(VisaStatus::VisaOnArrival));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn fallback_response_has_short_cache() {
        let resp = Lookup::Fallback(VisaTable::default()).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CACHE_CONTROL], FALLBACK_CACHE);
    }

    #[test]
    fn upstream_client_errors_pass_through() {
        let resp = Lookup::Upstream(404).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
