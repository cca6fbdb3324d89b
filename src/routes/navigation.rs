// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Navigation check consulted by the browser before showing a page.

use crate::error::{AppError, Result};
use crate::middleware::auth::token_from_request;
use crate::services::navigation::{self, Decision, Session};
use crate::AppState;
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/navigation", post(check_navigation))
}

#[derive(Debug, Deserialize)]
struct NavigationRequest {
    path: String,
}

/// Authentication is optional: without a valid token the visitor is
/// treated as signed out.
async fn check_navigation(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(request): Json<NavigationRequest>,
) -> Result<Json<Decision>> {
    if !request.path.starts_with('/') {
        return Err(AppError::BadRequest(
            "path must start with '/'".to_string(),
        ));
    }

    let session = Session::new(
        token_from_request(&jar, &headers),
        state.token_verifier.clone(),
    );
    let decision = navigation::evaluate(&request.path, &session, state.roles.as_ref()).await;

    tracing::debug!(path = %request.path, ?decision, "Navigation evaluated");
    Ok(Json(decision))
}
