pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use portal_core::middleware::{
    debug::debug_errors_middleware, request_log::request_log_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::PortalConfig;
use crate::services::{
    AclStore, CollaboratorDirectory, LocusListStore, ProjectStore, SessionStore, UserStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortalConfig>,
    pub users: Arc<dyn UserStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub locus_lists: Arc<dyn LocusListStore>,
    pub acl: Arc<dyn AclStore>,
    pub sessions: SessionStore,
    pub directory: Arc<CollaboratorDirectory>,
}

pub fn build_router(state: AppState) -> Router {
    // Routes reachable only with a live session.
    let protected = Router::new()
        .route("/api/users/get_options", get(handlers::users::get_options))
        .route(
            "/api/users/get_analyst_options",
            get(handlers::users::get_analyst_options),
        )
        .route(
            "/api/project/:guid/collaborators/create",
            post(handlers::users::create_collaborator),
        )
        .route(
            "/api/project/:guid/collaborators/:username/update",
            post(handlers::users::update_collaborator),
        )
        .route(
            "/api/project/:guid/collaborators/:username/delete",
            post(handlers::users::delete_collaborator),
        )
        .route(
            "/api/users/update_policies",
            post(handlers::users::update_policies),
        )
        .route(
            "/api/locus_lists/migrate_sharing",
            post(handlers::locus_lists::migrate_sharing),
        )
        .route("/api/bootstrap", get(handlers::app::bootstrap))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    // Account setup and recovery happen before a session exists.
    let public = Router::new()
        .route("/health", get(handlers::app::health_check))
        .route(
            "/api/users/:username/set_password",
            post(handlers::users::set_password),
        )
        .route(
            "/api/users/forgot_password",
            post(handlers::users::forgot_password),
        );

    let debug = state.config.debug;

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
        .layer(from_fn_with_state(debug, debug_errors_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        // Outermost of the three: sees the final response, including the
        // request id and principal attached to its extensions.
        .layer(from_fn(request_log_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(HeaderValue::from_static("http://localhost:3000"))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}
