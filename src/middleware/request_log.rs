use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, OriginalUri, Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Map, Value};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::database::models::date_audit::now;
use crate::database::models::LogEntry;
use crate::types::{LogLevel, Operation};

const ANONYMOUS: &str = "Anonymous";
const REDACTED: &str = "[REDACTED]";

/// Response bodies larger than this are not copied into the audit row
const MAX_RESULT_BYTES: usize = 64 * 1024;

/// Audits every request below `/api/v1`: a tracing span per request and one
/// `LogEntry` written in the background once the response is known.
pub async fn request_log_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = Uuid::new_v4();

    let method = request.method().clone();
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.clone())
        .unwrap_or_else(|| request.uri().clone());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer);
    let parameters = parameters(uri.query(), request.headers());

    let span = info_span!(
        "request",
        request_id = %request_id,
        client_ip = %ip,
        method = %method,
        endpoint = %uri.path(),
    );

    async move {
        info!("Request received: {} {} from IP: {}", method, uri, ip);

        let response = next.run(request).await;
        let status = response.status();
        let elapsed = started.elapsed().as_millis() as i64;
        info!("Request completed in {}ms with status {}", elapsed, status.as_u16());

        if !state.config.api.persist_request_logs {
            return response;
        }

        let user_name = response
            .extensions()
            .get::<AuthUser>()
            .map(|user| user.user_name.clone())
            .unwrap_or_else(|| ANONYMOUS.to_string());

        let (response, result) = capture_body(response).await;

        let entry = LogEntry {
            id: None,
            timestamp: now(),
            level: level_for(status),
            method: format!("{} {}", method, uri.path()),
            message: format!("{} {} completed with status {}", method, uri.path(), status.as_u16()),
            action: action_for(&method),
            execution_time_ms: elapsed,
            user_name,
            ip_address: ip,
            parameters: Some(parameters),
            result,
            stack_trace: None,
        };

        let logs = state.services.logs.clone();
        tokio::spawn(
            async move {
                if let Err(e) = logs.record(entry).await {
                    error!("Failed to persist request log: {}", e);
                }
            }
            .in_current_span(),
        );

        response
    }
    .instrument(span)
    .await
}

fn level_for(status: StatusCode) -> LogLevel {
    if status.is_server_error() {
        LogLevel::Error
    } else if status.is_client_error() {
        LogLevel::Warn
    } else {
        LogLevel::Info
    }
}

fn action_for(method: &Method) -> Operation {
    Operation::from_method(method.as_str())
}

/// First `X-Forwarded-For` hop, falling back to the socket peer
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("unknown"));

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// Query parameters and headers as one JSON document
fn parameters(query: Option<&str>, headers: &HeaderMap) -> String {
    let mut params = Map::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }

    let mut header_values = Map::new();
    for (name, value) in headers {
        let value = if name == axum::http::header::AUTHORIZATION {
            REDACTED.to_string()
        } else {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        };
        header_values.insert(name.as_str().to_string(), Value::String(value));
    }

    json!({ "query": params, "headers": header_values }).to_string()
}

/// Copy a response body of known, bounded size so it can be audited, then
/// hand back an equivalent response. Streamed or oversized bodies pass
/// through untouched.
async fn capture_body(response: Response) -> (Response, Option<String>) {
    let bounded = response
        .body()
        .size_hint()
        .upper()
        .is_some_and(|size| size <= MAX_RESULT_BYTES as u64);
    if !bounded {
        return (response, None);
    }

    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, MAX_RESULT_BYTES).await {
        Ok(bytes) => {
            let result = String::from_utf8_lossy(&bytes).into_owned();
            (Response::from_parts(parts, Body::from(bytes)), Some(result))
        }
        Err(e) => {
            error!("Failed to buffer error response: {}", e);
            (Response::from_parts(parts, Body::empty()), None)
        }
    }
}
