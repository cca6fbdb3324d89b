// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication, scoping and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Protected routes accept bearer tokens and the session cookie
//! 3. Per-user data is only reachable by its owner or an admin
//! 4. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use nutrition_tracker::models::Role;
use tower::ServiceExt;

mod common;
use common::{
    body_json, create_test_app, create_test_app_with, id_token, id_token_for_project,
    StaticRoles, TestDeps,
};

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn app_with_roles(roles: &[(&str, Role)]) -> common::TestApp {
    create_test_app_with(TestDeps {
        roles: StaticRoles::with(roles),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = create_test_app();

    let response = app.router.oneshot(get("/api/me", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(get("/api/me", Some("not-a-jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_other_project_rejected() {
    let app = create_test_app();
    let token = id_token_for_project("alice", "someone-elses-project");

    let response = app
        .router
        .oneshot(get("/api/me", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_with_bearer_token() {
    let app = create_test_app();
    let token = id_token("alice");

    let response = app
        .router
        .oneshot(get("/api/me", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["uid"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn test_me_with_session_cookie() {
    let app = app_with_roles(&[("root", Role::Admin)]);
    let token = id_token("root");

    let request = Request::builder()
        .uri("/api/me")
        .header(header::COOKIE, format!("__session={token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["role"], "admin");
}

#[tokio::test]
async fn test_failed_role_lookup_reports_default_role() {
    let app = create_test_app_with(TestDeps {
        roles: StaticRoles::failing(),
        ..Default::default()
    });
    let token = id_token("alice");

    let response = app
        .router
        .oneshot(get("/api/me", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["role"], "user");
}

#[tokio::test]
async fn test_other_users_data_forbidden() {
    let app = create_test_app();
    let token = id_token("alice");

    for uri in [
        "/api/users/bob/goals",
        "/api/users/bob/intake/today",
        "/api/users/bob/progress",
    ] {
        let response = app
            .router
            .clone()
            .oneshot(get(uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn test_admin_passes_user_scope() {
    let app = app_with_roles(&[("root", Role::Admin)]);
    let token = id_token("root");

    let response = app
        .router
        .oneshot(get("/api/users/bob/goals", Some(&token)))
        .await
        .unwrap();

    // Scope check passes; the offline database then fails.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "database_error");
}

#[tokio::test]
async fn test_owner_passes_user_scope() {
    let app = create_test_app();
    let token = id_token("alice");

    let response = app
        .router
        .oneshot(get("/api/users/alice/goals", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_admin_route_requires_admin_role() {
    let app = app_with_roles(&[("alice", Role::User)]);
    let token = id_token("alice");

    let request = Request::builder()
        .method("PUT")
        .uri("/api/admin/users/bob/role")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"role":"admin"}"#))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_route_without_token() {
    let app = create_test_app();

    let request = Request::builder()
        .method("PUT")
        .uri("/api/admin/users/bob/role")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"role":"admin"}"#))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_test_app();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/me")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_health_is_public() {
    let app = create_test_app();

    let response = app.router.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}
