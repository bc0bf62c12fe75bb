//! Fault taxonomy and HTTP classification.
//!
//! Faults raised anywhere in the request path are mapped to an HTTP status
//! and user-facing message by [`classify`]. The mapping is an explicit ordered
//! rule table with a fixed 500 fallback, so the resolution order is visible in
//! code and pinned by tests rather than hidden in trait dispatch.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// The sentinel status reported by the search backend when the real upstream
/// code is unknown.
pub const UNKNOWN_UPSTREAM_STATUS: Option<u16> = None;

#[derive(Debug, Error)]
pub enum Fault {
    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    /// Client-caused request error (missing fields, malformed payload).
    #[error("{0}")]
    InvalidRequest(String),

    /// The search backend index is missing or malformed.
    #[error("{0}")]
    InvalidIndex(String),

    /// The search query itself is unserviceable.
    #[error("{0}")]
    InvalidSearch(String),

    /// Could not reach the search backend at all.
    #[error("{0}")]
    SearchConnection(String),

    /// The search backend answered but the transport failed. `status` is the
    /// upstream code when the backend reported one.
    #[error("search transport error")]
    SearchTransport {
        status: Option<u16>,
        error: String,
        info: String,
    },

    /// An upstream HTTP integration returned an error response.
    #[error("{message}")]
    UpstreamHttp { status: u16, message: String },

    /// The external workspace/identity API rejected the call.
    #[error("{message}")]
    WorkspaceAuth { status: u16, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Discriminant used for the error-log set and for classification tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    PermissionDenied,
    NotFound,
    Unauthenticated,
    InvalidRequest,
    InvalidIndex,
    InvalidSearch,
    SearchConnection,
    SearchTransport,
    UpstreamHttp,
    WorkspaceAuth,
    Internal,
}

impl Fault {
    pub fn kind(&self) -> FaultKind {
        match self {
            Fault::PermissionDenied(_) => FaultKind::PermissionDenied,
            Fault::NotFound(_) => FaultKind::NotFound,
            Fault::Unauthenticated(_) => FaultKind::Unauthenticated,
            Fault::InvalidRequest(_) => FaultKind::InvalidRequest,
            Fault::InvalidIndex(_) => FaultKind::InvalidIndex,
            Fault::InvalidSearch(_) => FaultKind::InvalidSearch,
            Fault::SearchConnection(_) => FaultKind::SearchConnection,
            Fault::SearchTransport { .. } => FaultKind::SearchTransport,
            Fault::UpstreamHttp { .. } => FaultKind::UpstreamHttp,
            Fault::WorkspaceAuth { .. } => FaultKind::WorkspaceAuth,
            Fault::Internal(_) => FaultKind::Internal,
        }
    }
}

/// Fault kinds that are always worth an error-level log, whatever status they
/// resolve to.
pub const ERROR_LOG_KINDS: &[FaultKind] = &[FaultKind::InvalidIndex];

/// How a matched rule resolves the status: a constant, or a function of the
/// fault itself.
enum StatusRule {
    Fixed(u16),
    Resolve(fn(&Fault) -> u16),
}

struct ClassifyRule {
    applies: fn(&Fault) -> bool,
    status: StatusRule,
}

fn transport_status(fault: &Fault) -> u16 {
    match fault {
        // Upstream code when known, 400 for the unknown-status sentinel.
        Fault::SearchTransport { status, .. } => status.unwrap_or(400),
        _ => 500,
    }
}

fn carried_status(fault: &Fault) -> u16 {
    match fault {
        Fault::UpstreamHttp { status, .. } | Fault::WorkspaceAuth { status, .. } => *status,
        _ => 500,
    }
}

/// Ordered fault-to-status table. First match wins; no match falls back to
/// 500.
static STATUS_RULES: &[ClassifyRule] = &[
    ClassifyRule {
        applies: |f| matches!(f, Fault::PermissionDenied(_)),
        status: StatusRule::Fixed(403),
    },
    ClassifyRule {
        applies: |f| matches!(f, Fault::NotFound(_)),
        status: StatusRule::Fixed(404),
    },
    ClassifyRule {
        applies: |f| matches!(f, Fault::Unauthenticated(_)),
        status: StatusRule::Fixed(401),
    },
    ClassifyRule {
        applies: |f| matches!(f, Fault::InvalidRequest(_)),
        status: StatusRule::Fixed(400),
    },
    ClassifyRule {
        applies: |f| matches!(f, Fault::InvalidIndex(_)),
        status: StatusRule::Fixed(400),
    },
    ClassifyRule {
        applies: |f| matches!(f, Fault::InvalidSearch(_)),
        status: StatusRule::Fixed(400),
    },
    ClassifyRule {
        applies: |f| matches!(f, Fault::SearchConnection(_)),
        status: StatusRule::Fixed(504),
    },
    ClassifyRule {
        applies: |f| matches!(f, Fault::SearchTransport { .. }),
        status: StatusRule::Resolve(transport_status),
    },
    ClassifyRule {
        applies: |f| matches!(f, Fault::UpstreamHttp { .. }),
        status: StatusRule::Resolve(carried_status),
    },
    ClassifyRule {
        applies: |f| matches!(f, Fault::WorkspaceAuth { .. }),
        status: StatusRule::Resolve(carried_status),
    },
];

fn transport_message(fault: &Fault) -> String {
    match fault {
        Fault::SearchTransport {
            status,
            error,
            info,
        } => {
            let status = status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            format!("SearchTransport: {} - {:?} - {}", status, error, info)
        }
        _ => fault.to_string(),
    }
}

/// Ordered fault-to-message table, mirroring the status table. Default is the
/// fault's Display form.
static MESSAGE_RULES: &[(fn(&Fault) -> bool, fn(&Fault) -> String)] = &[
    (
        |f| matches!(f, Fault::SearchConnection(_)),
        |f| f.to_string(),
    ),
    (
        |f| matches!(f, Fault::SearchTransport { .. }),
        transport_message,
    ),
];

/// The classified form of a fault, ready to serialize as the JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedResponse {
    #[serde(skip)]
    pub status: u16,
    #[serde(rename = "error")]
    pub message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub log_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

/// Map a fault to its HTTP response shape. Pure: emitting the response and
/// logging are the caller's concern.
pub fn classify(fault: &Fault, debug: bool) -> ClassifiedResponse {
    let status = STATUS_RULES
        .iter()
        .find(|rule| (rule.applies)(fault))
        .map(|rule| match &rule.status {
            StatusRule::Fixed(code) => *code,
            StatusRule::Resolve(resolve) => resolve(fault),
        })
        .unwrap_or(500);

    let message = MESSAGE_RULES
        .iter()
        .find(|(applies, _)| applies(fault))
        .map(|(_, format)| format(fault))
        .unwrap_or_else(|| fault.to_string());

    let log_error = ERROR_LOG_KINDS.contains(&fault.kind());

    let traceback = if status == 500 || debug {
        Some(format!("{:?}", fault))
    } else {
        None
    };

    ClassifiedResponse {
        status,
        message,
        log_error,
        traceback,
    }
}

/// The debug-variant JSON body of a fault response, attached to the response
/// extensions so [`crate::middleware::debug::debug_errors_middleware`] can
/// swap it in when the deployment runs with debug on. The debug flag lives in
/// that layer's state, not in any process global.
#[derive(Debug, Clone)]
pub struct VerboseErrorBody(pub String);

impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        let classified = classify(&self, false);
        let verbose = classify(&self, true);
        let status = StatusCode::from_u16(classified.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(classified)).into_response();
        if let Ok(body) = serde_json::to_string(&verbose) {
            response.extensions_mut().insert(VerboseErrorBody(body));
        }
        response
    }
}
