//! HTTP surface tests through the axum router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use utoipa_axum::router::OpenApiRouter;

use ic_config::AppConfig;
use ic_identity::store::PasswordPolicy;
use ic_identity::{
    identity_router, ClaimTypeCatalog, IdentityContext, InMemoryPrincipalStore, PasswordService, PrincipalStore,
};

fn app() -> Router {
    let store: Arc<dyn PrincipalStore> = Arc::new(InMemoryPrincipalStore::new(
        PasswordService::testing(PasswordPolicy::default()).unwrap(),
    ));
    let ctx = IdentityContext::new(store, ClaimTypeCatalog::well_known(), &AppConfig::default());
    let (router, _openapi) = OpenApiRouter::new()
        .nest("/api/identity", identity_router(&ctx))
        .split_for_parts();
    router
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_user(app: &Router, user_name: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/identity/users",
        Some(json!({
            "userName": user_name,
            "name": "Alice Liddell",
            "email": format!("{}@example.com", user_name),
            "password": "Passw0rd"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_reports_up() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/identity/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
}

#[tokio::test]
async fn test_claim_types_are_listed_sorted() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/identity/claim-types", None).await;
    assert_eq!(status, StatusCode::OK);

    let keys: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["key"].as_str().unwrap())
        .collect();
    assert!(keys.contains(&"Name"));
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[tokio::test]
async fn test_role_create_and_lookup() {
    let app = app();
    for name in ["Viewer", "Admin"] {
        let (status, _) = send(&app, Method::POST, "/api/identity/roles", Some(json!({ "name": name }))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::POST, "/api/identity/roles", Some(json!({ "name": "admin" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_FAILED");

    let (status, body) = send(&app, Method::GET, "/api/identity/roles/lookup", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body.as_array().unwrap().iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Admin", "Viewer"]);

    let (status, body) = send(&app, Method::GET, "/api/identity/roles?sort=name%20DESC", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"][0]["name"], "Viewer");
}

#[tokio::test]
async fn test_user_update_round_trip() {
    let app = app();
    send(&app, Method::POST, "/api/identity/roles", Some(json!({ "name": "Editor" }))).await;
    let id = create_user(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/identity/users/{}", id),
        Some(json!({
            "email": "alice@example.com",
            "locked": true,
            "roles": ["Editor"],
            "claims": [{ "key": "Name", "value": "Alice Liddell" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["applied"], json!(["grant role 'Editor'"]));

    let (status, body) = send(&app, Method::GET, "/api/identity/users?search=ALICE", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    let user = &body["data"][0];
    assert_eq!(user["locked"], true);
    assert_eq!(user["displayName"], "Alice Liddell");
    assert_eq!(user["roles"], json!(["Editor"]));
}

#[tokio::test]
async fn test_unknown_claim_key_is_bad_request() {
    let app = app();
    let id = create_user(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/identity/users/{}", id),
        Some(json!({
            "email": "alice@example.com",
            "claims": [{ "key": "ShoeSize", "value": "42" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_KEY");
}

#[tokio::test]
async fn test_partial_apply_is_conflict_with_failures() {
    let app = app();
    send(&app, Method::POST, "/api/identity/roles", Some(json!({ "name": "Viewer" }))).await;
    let id = create_user(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/identity/users/{}", id),
        Some(json!({
            "email": "alice@example.com",
            "roles": ["Viewer", "Ghost"],
            "claims": [{ "key": "Name", "value": "Alice Liddell" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "PARTIAL_APPLY");
    assert_eq!(body["failed"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bad_listing_parameters_are_rejected() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/identity/users?sort=passwordHash%20ASC", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_KEY");

    let (status, _) = send(&app, Method::GET, "/api/identity/users?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/identity/users?limit=100000", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_principals_are_not_found() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/identity/users/nope",
        Some(json!({ "email": "x@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, _) = send(&app, Method::DELETE, "/api/identity/roles/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_password_reset_and_delete() {
    let app = app();
    let id = create_user(&app, "alice").await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/identity/users/{}/password", id),
        Some(json!({ "password": "N3wSecret", "verify": "different" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/identity/users/{}/password", id),
        Some(json!({ "password": "N3wSecret", "verify": "N3wSecret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/identity/users/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/identity/users", None).await;
    assert_eq!(body["total"], 0);
}
