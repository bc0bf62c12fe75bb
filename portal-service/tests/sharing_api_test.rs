//! Router-level tests for the gene list sharing migration endpoint.

mod common;

use axum::http::StatusCode;
use common::{test_app, LOCAL_PROJECT};
use portal_service::models::{LocusList, Permission, Principal, Resource, User};
use portal_service::services::{AclStore, LocusListStore, UserStore};
use serde_json::json;

async fn seed_legacy_list(app: &common::TestApp) -> LocusList {
    let list = LocusList::new("LL00001_panel", "Test Panel", Some("creator"));
    app.locus_lists.insert(list.clone());

    let resource = Resource::LocusList(list.guid.clone());
    app.acl
        .grant(
            Principal::Group(format!("{}_can_view", LOCAL_PROJECT)),
            Permission::CanView,
            resource.clone(),
        )
        .await
        .unwrap();
    for permission in [Permission::IsOwner, Permission::CanEdit, Permission::CanView] {
        app.acl
            .grant(
                Principal::User("creator".to_string()),
                permission,
                resource.clone(),
            )
            .await
            .unwrap();
    }
    list
}

async fn sign_in_superuser(app: &common::TestApp) -> String {
    let mut admin = User::new("admin@test.com");
    admin.is_superuser = true;
    app.users.insert(admin.clone()).await.unwrap();
    app.sign_in(&admin)
}

#[tokio::test]
async fn test_migrate_sharing_requires_superuser() {
    let app = test_app().await;
    let token = app.sign_in(&app.manager);

    let (status, body) = app
        .post(
            "/api/locus_lists/migrate_sharing",
            Some(&token),
            json!({"direction": "forward"}),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Superuser access required");
}

#[tokio::test]
async fn test_migrate_sharing_forward_runs_batch() {
    let app = test_app().await;
    let list = seed_legacy_list(&app).await;
    let token = sign_in_superuser(&app).await;

    let (status, body) = app
        .post(
            "/api/locus_lists/migrate_sharing",
            Some(&token),
            json!({"direction": "forward"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"migrated": 1, "failed": 0}));

    let migrated = app.locus_lists.get(&list.guid).await.unwrap();
    assert_eq!(migrated.projects, vec![LOCAL_PROJECT.to_string()]);

    let resource = Resource::LocusList(list.guid.clone());
    let creator = Principal::User("creator".to_string());
    for permission in [Permission::IsOwner, Permission::CanEdit, Permission::CanView] {
        assert!(!app.acl.has(&creator, permission, &resource).await.unwrap());
    }
}

#[tokio::test]
async fn test_migrate_sharing_backward_restores_grants() {
    let app = test_app().await;
    let mut list = LocusList::new("LL00002_panel", "Restored Panel", Some("creator"));
    list.projects = vec![LOCAL_PROJECT.to_string()];
    app.locus_lists.insert(list.clone());
    let token = sign_in_superuser(&app).await;

    let (status, body) = app
        .post(
            "/api/locus_lists/migrate_sharing",
            Some(&token),
            json!({"direction": "backward"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"migrated": 1, "failed": 0}));

    let resource = Resource::LocusList(list.guid.clone());
    let group = Principal::Group(format!("{}_can_view", LOCAL_PROJECT));
    assert!(app
        .acl
        .has(&group, Permission::CanView, &resource)
        .await
        .unwrap());
}
