//! Drives the HTTP surface end to end against the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use herald_notification::config::{AppConfig, StorageBackend};
use herald_notification::models::NewNotice;
use herald_notification::store::{MemoryNotificationStore, NotificationStore};
use herald_notification::{router, AppState};
use herald_shared::middleware::{detached_metrics_handle, DEV_JWT_SECRET};
use herald_shared::types::auth::{Claims, UserRole};

struct TestApp {
    router: Router,
    store: Arc<MemoryNotificationStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryNotificationStore::default());
        let config = AppConfig {
            storage: StorageBackend::Memory,
            ..AppConfig::default()
        };
        let state = Arc::new(AppState::new(config, store.clone(), detached_metrics_handle()));
        Self {
            router: router(state),
            store,
        }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

fn token(role: UserRole) -> (Uuid, String) {
    let claims = Claims::new(Uuid::now_v7(), role, 3600);
    (claims.sub, claims.encode(DEV_JWT_SECRET).unwrap())
}

#[tokio::test]
async fn broadcast_banner_round_trip() {
    let app = TestApp::new();
    let (_, admin) = token(UserRole::Admin);
    let (_, viewer) = token(UserRole::User);

    let (status, body) = app
        .send(
            Method::POST,
            "/notifications",
            Some(&admin),
            Some(json!({ "title": "Maintenance", "body": "System down 5pm", "audience": "everyone" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["kind"], "banner");

    let (status, body) = app.send(Method::GET, "/notifications/next", Some(&viewer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["display_style"], "info");
    assert_eq!(body["data"]["css_class"], "updated");
    assert!(body["data"].get("audience").is_none());

    let (status, body) = app
        .send(Method::POST, &format!("/notifications/{id}/viewed"), Some(&viewer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["viewed"], true);

    let (_, body) = app.send(Method::GET, "/notifications/next", Some(&viewer), None).await;
    assert!(body["data"].is_null());

    let (_, body) = app
        .send(Method::GET, &format!("/notifications/{id}/status"), Some(&viewer), None)
        .await;
    assert_eq!(body["data"]["viewed"], true);
}

#[tokio::test]
async fn targeted_alert_only_reaches_recipient() {
    let app = TestApp::new();
    let (_, admin) = token(UserRole::Admin);
    let (_, u1) = token(UserRole::User);
    let (u2_id, u2) = token(UserRole::User);

    let (status, _) = app
        .send(
            Method::POST,
            "/notifications",
            Some(&admin),
            Some(json!({ "title": "Billing issue", "body": "Check invoice", "audience": [u2_id], "kind": "alert" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.send(Method::GET, "/notifications/next", Some(&u1), None).await;
    assert!(body["data"].is_null());

    let (_, body) = app.send(Method::GET, "/notifications/next", Some(&u2), None).await;
    assert_eq!(body["data"]["kind"], "alert");
    assert_eq!(body["data"]["css_class"], "error");

    let (_, body) = app.send(Method::GET, "/notifications/pending-count", Some(&u2), None).await;
    assert_eq!(body["data"]["count"], 1);
}

#[tokio::test]
async fn only_the_audience_can_mark_a_notice_viewed() {
    let app = TestApp::new();
    let (_, admin) = token(UserRole::Admin);
    let (_, outsider) = token(UserRole::User);
    let (member_id, member) = token(UserRole::User);
    let notice = app
        .store
        .create(NewNotice::new("Billing issue", "Check invoice").for_audience(member_id))
        .unwrap();
    let uri = format!("/notifications/{}/viewed", notice.id);

    let (status, body) = app.send(Method::POST, &uri, Some(&outsider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "E0005");
    assert!(!app.store.is_viewed(notice.id).unwrap());

    let (_, body) = app.send(Method::GET, "/notifications/next", Some(&member), None).await;
    assert_eq!(body["data"]["id"], notice.id.to_string());

    let (status, _) = app.send(Method::POST, &uri, Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.store.is_viewed(notice.id).unwrap());

    let other = app
        .store
        .create(NewNotice::new("Audit", "Quarterly").for_audience(member_id))
        .unwrap();
    let (status, _) = app
        .send(Method::POST, &format!("/notifications/{}/viewed", other.id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.store.is_viewed(other.id).unwrap());
}

#[tokio::test]
async fn notices_are_served_in_creation_order() {
    let app = TestApp::new();
    let (_, viewer) = token(UserRole::User);
    let n1 = app.store.create(NewNotice::new("N1", "first")).unwrap();
    let n2 = app.store.create(NewNotice::new("N2", "second")).unwrap();

    let (_, body) = app.send(Method::GET, "/notifications/next", Some(&viewer), None).await;
    assert_eq!(body["data"]["id"], n1.id.to_string());

    app.send(Method::POST, &format!("/notifications/{}/viewed", n1.id), Some(&viewer), None)
        .await;

    let (_, body) = app.send(Method::GET, "/notifications/next", Some(&viewer), None).await;
    assert_eq!(body["data"]["id"], n2.id.to_string());
}

#[tokio::test]
async fn only_admins_can_post() {
    let app = TestApp::new();
    let (_, viewer) = token(UserRole::User);

    let (status, body) = app
        .send(
            Method::POST,
            "/notifications",
            Some(&viewer),
            Some(json!({ "title": "t", "body": "b" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "E0005");
    assert_eq!(app.store.list_all(10, 0).unwrap().1, 0);

    let (status, _) = app
        .send(Method::POST, "/notifications", None, Some(json!({ "title": "t", "body": "b" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_posts_are_rejected_without_writes() {
    let app = TestApp::new();
    let (_, admin) = token(UserRole::Admin);

    let bad_bodies = [
        json!({ "title": "", "body": "b" }),
        json!({ "title": "t", "body": "" }),
        json!({ "title": "t", "body": "b", "audience": [] }),
        json!({ "title": "t", "body": "b", "audience": "not-an-id" }),
        json!({ "title": "t", "body": "b", "kind": "toast" }),
    ];

    for bad in bad_bodies {
        let (status, body) = app.send(Method::POST, "/notifications", Some(&admin), Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "E0002");
    }

    assert_eq!(app.store.list_all(10, 0).unwrap().1, 0);
}

#[tokio::test]
async fn listing_hides_audience_from_non_admins() {
    let app = TestApp::new();
    let (_, admin) = token(UserRole::Admin);
    let (viewer_id, viewer) = token(UserRole::User);

    app.store.create(NewNotice::new("everyone", "b")).unwrap();
    app.store.create(NewNotice::new("mine", "b").for_audience(viewer_id)).unwrap();
    app.store.create(NewNotice::new("other", "b").for_audience(Uuid::now_v7())).unwrap();

    let (_, body) = app.send(Method::GET, "/notifications", Some(&admin), None).await;
    assert_eq!(body["data"]["total"], 3);
    assert!(body["data"]["items"][0].get("audience").is_some());

    let (_, body) = app.send(Method::GET, "/notifications?page=1&per_page=1", Some(&viewer), None).await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"][0]["title"], "mine");
    assert!(body["data"]["items"][0].get("audience").is_none());
}

#[tokio::test]
async fn unknown_ids() {
    let app = TestApp::new();
    let (_, viewer) = token(UserRole::User);
    let missing = Uuid::now_v7();

    let (status, body) = app
        .send(Method::GET, &format!("/notifications/{missing}/status"), Some(&viewer), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "E5001");

    let (status, _) = app
        .send(Method::POST, &format!("/notifications/{missing}/viewed"), Some(&viewer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_reports_store_backend() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"][0]["name"], "store:memory");
}
