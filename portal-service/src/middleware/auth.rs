use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use portal_core::error::Fault;
use portal_core::middleware::request_log::AuthenticatedPrincipal;

use crate::models::User;
use crate::AppState;

/// Middleware to require an authenticated session.
///
/// Resolves the bearer token to a user and stores the full record in the
/// request extensions for handlers. The signed-in email is also attached to
/// the response extensions so the request logger can report who made the
/// call.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Fault> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            Fault::Unauthenticated("Missing or invalid Authorization header".to_string())
        })?;

    let username = state
        .sessions
        .resolve(token)
        .ok_or_else(|| Fault::Unauthenticated("Invalid or expired session".to_string()))?;

    let user = state
        .users
        .find_by_username(&username)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| Fault::Unauthenticated("Invalid or expired session".to_string()))?;

    let principal = AuthenticatedPrincipal(user.email.clone());
    req.extensions_mut().insert(user);

    let mut response = next.run(req).await;
    response.extensions_mut().insert(principal);
    Ok(response)
}

/// Extractor for the authenticated user placed in extensions by
/// [`auth_middleware`].
pub struct AuthUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Fault;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().ok_or_else(|| {
            Fault::Internal(anyhow::anyhow!("Authenticated user missing from request extensions"))
        })?;

        Ok(AuthUser(user.clone()))
    }
}
