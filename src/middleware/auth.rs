// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token authentication middleware.

use crate::error::AppError;
use crate::models::Role;
use crate::services::firebase_auth::TokenError;
use crate::services::navigation::resolve_role;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie that may carry the ID token instead of the `Authorization` header.
pub const SESSION_COOKIE: &str = "__session";

/// Authenticated user extracted from the ID token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

/// Extract a bearer token from an `Authorization` header value.
pub fn extract_bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Session cookie first, then the `Authorization` header.
pub fn token_from_request(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string)
}

/// Middleware that requires a valid ID token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = token_from_request(&jar, request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let verified = match state.token_verifier.verify(&token).await {
        Ok(user) => user,
        Err(TokenError::Invalid(reason)) => {
            tracing::debug!(reason = %reason, "Rejected ID token");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(TokenError::Transient(reason)) => {
            tracing::error!(reason = %reason, "ID token verification unavailable");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    request.extensions_mut().insert(AuthUser {
        uid: verified.uid,
        email: verified.email,
    });

    Ok(next.run(request).await)
}

/// Middleware for admin-only endpoints. Must run after [`require_auth`].
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Response {
    match require_role(&state, &user, Role::Admin).await {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// Fail with 403 unless the user's role is `required`.
pub async fn require_role(state: &AppState, user: &AuthUser, required: Role) -> Result<(), AppError> {
    let role = resolve_role(state.roles.as_ref(), &user.uid).await;
    if role == required {
        return Ok(());
    }

    tracing::warn!(uid = %user.uid, %role, %required, "Role check failed");
    Err(AppError::Forbidden(format!("Requires role {required}")))
}

/// Allow access to `users/{uid}` data only for its owner or an admin.
pub async fn authorize_user_scope(
    state: &AppState,
    user: &AuthUser,
    uid: &str,
) -> Result<(), AppError> {
    if user.uid == uid {
        return Ok(());
    }

    require_role(state, user, Role::Admin)
        .await
        .map_err(|_| AppError::Forbidden("Cannot access another user's data".to_string()))
}
