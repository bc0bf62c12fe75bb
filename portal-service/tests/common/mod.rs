//! Shared harness for router-level tests: an app wired with in-memory stores
//! and a recording notifier, exercised through `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use portal_core::config as core_config;
use portal_service::{
    build_router,
    config::{Environment, PortalConfig, SlackConfig, SmtpConfig},
    models::{project::Workspace, Project, User},
    services::{
        CollaboratorDirectory, DirectorySettings, InMemoryAclStore, InMemoryLocusListStore,
        InMemoryProjectStore, InMemoryUserStore, MockNotifier, SessionStore, SlackClient,
        UserStore,
    },
    AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const LOCAL_PROJECT: &str = "R0002_empty";
pub const EXTERNAL_PROJECT: &str = "R0001_1kg";

pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUserStore>,
    pub locus_lists: Arc<InMemoryLocusListStore>,
    pub acl: Arc<InMemoryAclStore>,
    pub sessions: SessionStore,
    pub notifier: Arc<MockNotifier>,
    pub manager: User,
    pub collaborator: User,
}

fn test_config() -> PortalConfig {
    PortalConfig {
        common: core_config::Config { port: 8080 },
        environment: Environment::Dev,
        service_name: "portal-service".to_string(),
        service_version: "test".to_string(),
        log_level: "info".to_string(),
        debug: false,
        base_url: "http://localhost:8080".to_string(),
        analyst_group: "analysts".to_string(),
        data_manager_group: "data_managers".to_string(),
        pm_group: "project_managers".to_string(),
        privacy_version: "1.1".to_string(),
        tos_version: "2.2".to_string(),
        google_login_enabled: false,
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from_email: "noreply@localhost".to_string(),
        },
        slack: SlackConfig {
            webhook_url: None,
            notification_channel: "#portal".to_string(),
        },
    }
}

/// An app with one locally managed project, one workspace-backed project, a
/// manager on both, and a plain view-only collaborator on the local project.
pub async fn test_app() -> TestApp {
    let config = test_config();

    let users = Arc::new(InMemoryUserStore::new());
    let projects = Arc::new(InMemoryProjectStore::new());
    let locus_lists = Arc::new(InMemoryLocusListStore::new());
    let acl = Arc::new(InMemoryAclStore::new());
    let sessions = SessionStore::new();
    let notifier = Arc::new(MockNotifier::new());
    let slack = SlackClient::new(&config.slack);

    let local = Project::new(LOCAL_PROJECT, "Empty Project");
    projects.insert(local.clone());

    let mut external = Project::new(EXTERNAL_PROJECT, "1kg Project");
    external.workspace = Some(Workspace {
        namespace: "my-billing".to_string(),
        name: "1kg-workspace".to_string(),
    });
    projects.insert(external.clone());

    let mut manager = User::new("manager@test.com");
    manager.first_name = "Test".to_string();
    manager.last_name = "Manager".to_string();
    users.insert(manager.clone()).await.unwrap();
    for group in [
        &local.can_view_group,
        &local.can_edit_group,
        &external.can_view_group,
        &external.can_edit_group,
    ] {
        users.add_to_group(group, &manager.username).await.unwrap();
    }

    let mut collaborator = User::new("viewer@test.com");
    collaborator.first_name = "Plain".to_string();
    collaborator.last_name = "Viewer".to_string();
    users.insert(collaborator.clone()).await.unwrap();
    users
        .add_to_group(&local.can_view_group, &collaborator.username)
        .await
        .unwrap();

    let directory = Arc::new(CollaboratorDirectory::new(
        users.clone(),
        projects.clone(),
        notifier.clone(),
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
        config: Arc::new(config),
        users: users.clone(),
        projects: projects.clone(),
        locus_lists: locus_lists.clone(),
        acl: acl.clone(),
        sessions: sessions.clone(),
        directory,
    };

    TestApp {
        router: build_router(state),
        users,
        locus_lists,
        acl,
        sessions,
        notifier,
        manager,
        collaborator,
    }
}

impl TestApp {
    pub fn sign_in(&self, user: &User) -> String {
        self.sessions.issue(&user.username)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send("GET", uri, token, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.send("POST", uri, token, Some(body)).await
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}
