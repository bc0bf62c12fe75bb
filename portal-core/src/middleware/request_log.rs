//! Structured per-request logging.
//!
//! Emits exactly one log record per completed request, after the error body
//! (if any) has been produced, with the HTTP metadata attached as structured
//! fields rather than interpolated into the message. The record shape follows
//! the Stackdriver httpRequest convention the original deployment logged to.

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Request},
    http::header,
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::net::SocketAddr;

use super::tracing::RequestId;

pub const PASSWORD_MASK: &str = "***";

/// Authenticated principal, attached to response extensions by the auth
/// layer so the logger can record who made the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSeverity {
    Error,
    Warning,
    Info,
}

/// Severity ladder: error for flagged or server-side failures, except 504
/// (search backend unavailable) which is a known transient condition and is
/// demoted to warning to avoid alert fatigue; warning for client errors.
pub fn severity(status: u16, log_error: bool) -> LogSeverity {
    if log_error || (status >= 500 && status != 504) {
        LogSeverity::Error
    } else if status >= 400 {
        LogSeverity::Warning
    } else {
        LogSeverity::Info
    }
}

/// Parse a request body as JSON, masking any top-level `password` value.
/// Non-JSON bodies are omitted, not an error.
pub fn parse_request_body(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    let mut body: Value = serde_json::from_slice(bytes).ok()?;
    if let Some(obj) = body.as_object_mut() {
        if let Some(password) = obj.get_mut("password") {
            *password = Value::String(PASSWORD_MASK.to_string());
        }
    }
    Some(body)
}

/// What the logger pulls back out of a JSON response body.
#[derive(Debug, Default, PartialEq)]
pub struct ResponseDetails {
    pub error: String,
    pub log_error: bool,
    pub traceback: Option<String>,
}

/// Extract the error string (or joined `errors` list), traceback and
/// log-error flag from a response body. Parse failure is tolerated silently.
pub fn parse_response_details(bytes: &[u8]) -> ResponseDetails {
    let Ok(body) = serde_json::from_slice::<Value>(bytes) else {
        return ResponseDetails::default();
    };

    let mut error = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            error = errors
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ");
        }
    }

    ResponseDetails {
        error,
        log_error: body
            .get("log_error")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        traceback: body
            .get("traceback")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

pub async fn request_log_middleware(req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let request_bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => Bytes::new(),
    };

    let request_method = parts.method.to_string();
    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let request_url = if host.is_empty() {
        parts.uri.to_string()
    } else {
        format!("http://{}{}", host, parts.uri)
    };
    let user_agent = header_str(&parts.headers, header::USER_AGENT);
    let referer = header_str(&parts.headers, header::REFERER);
    let protocol = format!("{:?}", parts.version);
    let remote_ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .or_else(|| {
            parts
                .headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_default();
    let declared_length: Option<u64> = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.parse().ok());

    let request_body = parse_request_body(&request_bytes)
        .map(|body| body.to_string())
        .unwrap_or_default();

    let req = Request::from_parts(parts, Body::from(request_bytes));
    let response = next.run(req).await;

    let (parts, body) = response.into_parts();
    let response_bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => Bytes::new(),
    };

    let status = parts.status.as_u16();
    // Body length when available, the request's declared content-length
    // otherwise.
    let response_size = if response_bytes.is_empty() {
        declared_length.unwrap_or(0)
    } else {
        response_bytes.len() as u64
    };

    let details = parse_response_details(&response_bytes);
    let user = parts
        .extensions
        .get::<AuthenticatedPrincipal>()
        .map(|principal| principal.0.clone())
        .unwrap_or_default();
    let request_id = parts
        .extensions
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let message = match severity(status, details.log_error) {
        LogSeverity::Error | LogSeverity::Warning => details.error.clone(),
        LogSeverity::Info => String::new(),
    };
    let traceback = details.traceback.clone().unwrap_or_default();

    match severity(status, details.log_error) {
        LogSeverity::Error => tracing::error!(
            target: "http_request",
            request_method = %request_method,
            request_url = %request_url,
            status,
            response_size,
            user_agent = %user_agent,
            remote_ip = %remote_ip,
            referer = %referer,
            protocol = %protocol,
            request_body = %request_body,
            traceback = %traceback,
            user = %user,
            request_id = %request_id,
            "{}",
            message
        ),
        LogSeverity::Warning => tracing::warn!(
            target: "http_request",
            request_method = %request_method,
            request_url = %request_url,
            status,
            response_size,
            user_agent = %user_agent,
            remote_ip = %remote_ip,
            referer = %referer,
            protocol = %protocol,
            request_body = %request_body,
            traceback = %traceback,
            user = %user,
            request_id = %request_id,
            "{}",
            message
        ),
        LogSeverity::Info => tracing::info!(
            target: "http_request",
            request_method = %request_method,
            request_url = %request_url,
            status,
            response_size,
            user_agent = %user_agent,
            remote_ip = %remote_ip,
            referer = %referer,
            protocol = %protocol,
            request_body = %request_body,
            user = %user,
            request_id = %request_id,
            "{}",
            message
        ),
    }

    Response::from_parts(parts, Body::from(response_bytes))
}

fn header_str(headers: &axum::http::HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
