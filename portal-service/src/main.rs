use portal_core::error::Fault;
use portal_core::observability::logging::init_tracing;
use portal_service::{
    build_router,
    config::PortalConfig,
    services::{
        CollaboratorDirectory, DirectorySettings, InMemoryAclStore, InMemoryLocusListStore,
        InMemoryProjectStore, InMemoryUserStore, SessionStore, SlackClient, SmtpNotifier,
    },
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), Fault> {
    // Load configuration, fail fast if invalid.
    let config = PortalConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting portal service"
    );

    let users = Arc::new(InMemoryUserStore::new());
    let projects = Arc::new(InMemoryProjectStore::new());
    let locus_lists = Arc::new(InMemoryLocusListStore::new());
    let acl = Arc::new(InMemoryAclStore::new());
    let sessions = SessionStore::new();

    let notifier = Arc::new(SmtpNotifier::new(&config.smtp)?);
    let slack = SlackClient::new(&config.slack);

    let directory = Arc::new(CollaboratorDirectory::new(
        users.clone(),
        projects.clone(),
        notifier,
        slack,
        DirectorySettings {
            base_url: config.base_url.clone(),
            analyst_group: config.analyst_group.clone(),
            data_manager_group: config.data_manager_group.clone(),
            pm_group: config.pm_group.clone(),
            privacy_version: config.privacy_version.clone(),
            tos_version: config.tos_version.clone(),
            notification_channel: config.slack.notification_channel.clone(),
        },
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        users,
        projects,
        locus_lists,
        acl,
        sessions,
        directory,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Fault::Internal(anyhow::anyhow!(e)))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| Fault::Internal(anyhow::anyhow!(e)))?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
