//! Debug-mode expansion of fault responses.
//!
//! A [`crate::error::Fault`] serializes without a traceback below 500 and
//! attaches its debug-variant body to the response extensions. This layer
//! carries the deployment's debug flag as its state and swaps the verbose
//! body in when the flag is on, so nothing about error rendering depends on
//! process-global state.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::VerboseErrorBody;

pub async fn debug_errors_middleware(
    State(debug): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !debug {
        return response;
    }

    let verbose = response.extensions().get::<VerboseErrorBody>().cloned();
    match verbose {
        Some(VerboseErrorBody(body)) => {
            let (mut parts, _) = response.into_parts();
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(body))
        }
        None => response,
    }
}
