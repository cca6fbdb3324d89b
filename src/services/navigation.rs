// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page access policy.
//!
//! Every page route is public, public-only (login/register), authenticated,
//! or restricted to a role. [`evaluate`] resolves the session at most once
//! and returns either `allow` or the redirect the browser should follow.

use crate::error::AppError;
use crate::models::Role;
use crate::services::firebase_auth::{FirebaseTokenVerifier, TokenError, VerifiedUser};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const LANDING_PATH: &str = "/dashboard";
pub const LOGIN_PATH: &str = "/login";

/// Access requirement for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    /// Only for visitors without a session.
    PublicOnly,
    Authenticated,
    Role(Role),
}

/// Known pages. Anything else requires a session.
pub const ROUTES: &[(&str, RouteAccess)] = &[
    ("/", RouteAccess::Public),
    ("/recipes", RouteAccess::Public),
    ("/login", RouteAccess::PublicOnly),
    ("/register", RouteAccess::PublicOnly),
    ("/dashboard", RouteAccess::Authenticated),
    ("/admin", RouteAccess::Role(Role::Admin)),
];

/// Look up the access requirement for a target such as `/admin?tab=users`.
/// Paths match without regard to ASCII case.
pub fn access_for(target: &str) -> RouteAccess {
    let path = target
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    ROUTES
        .iter()
        .find(|(route, _)| path.eq_ignore_ascii_case(route))
        .map(|(_, access)| *access)
        .unwrap_or(RouteAccess::Authenticated)
}

/// Outcome of a navigation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Redirect { location: String },
}

impl Decision {
    fn redirect(location: impl Into<String>) -> Self {
        Decision::Redirect {
            location: location.into(),
        }
    }
}

/// Source of user roles (the profile document in production).
#[async_trait]
pub trait RoleSource: Send + Sync {
    /// `Ok(None)` when the user has no profile document.
    async fn role_of(&self, uid: &str) -> Result<Option<Role>, AppError>;
}

/// Role used for access checks. Lookup failures count as the default role.
pub async fn resolve_role(roles: &dyn RoleSource, uid: &str) -> Role {
    match roles.role_of(uid).await {
        Ok(role) => role.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(uid, error = %e, "Role lookup failed; using default role");
            Role::default()
        }
    }
}

/// Authentication state for one navigation, resolved lazily and only once.
pub struct Session {
    token: Option<String>,
    verifier: Option<Arc<FirebaseTokenVerifier>>,
    user: OnceCell<Option<VerifiedUser>>,
}

impl Session {
    /// A session that verifies `token` on first use.
    pub fn new(token: Option<String>, verifier: Arc<FirebaseTokenVerifier>) -> Self {
        Self {
            token,
            verifier: Some(verifier),
            user: OnceCell::new(),
        }
    }

    /// A session whose user is already known.
    pub fn resolved(user: Option<VerifiedUser>) -> Self {
        Self {
            token: None,
            verifier: None,
            user: OnceCell::new_with(Some(user)),
        }
    }

    /// The current user, if any.
    pub async fn user(&self) -> Option<&VerifiedUser> {
        self.user
            .get_or_init(|| async {
                let (Some(token), Some(verifier)) = (&self.token, &self.verifier) else {
                    return None;
                };
                match verifier.verify(token).await {
                    Ok(user) => Some(user),
                    Err(TokenError::Invalid(reason)) => {
                        tracing::debug!(reason = %reason, "Ignoring invalid session token");
                        None
                    }
                    Err(TokenError::Transient(reason)) => {
                        tracing::warn!(reason = %reason, "Session could not be verified");
                        None
                    }
                }
            })
            .await
            .as_ref()
    }

    /// Whether the user has been resolved yet.
    pub fn is_resolved(&self) -> bool {
        self.user.initialized()
    }
}

/// Decide whether navigation to `target` may proceed.
pub async fn evaluate(target: &str, session: &Session, roles: &dyn RoleSource) -> Decision {
    let access = access_for(target);

    if access == RouteAccess::Public {
        return Decision::Allow;
    }

    let user = session.user().await;

    match (access, user) {
        (RouteAccess::PublicOnly, Some(_)) => Decision::redirect(LANDING_PATH),
        (RouteAccess::PublicOnly, None) => Decision::Allow,
        (_, None) => Decision::redirect(format!(
            "{LOGIN_PATH}?redirect={}",
            urlencoding::encode(target)
        )),
        (RouteAccess::Role(required), Some(user)) => {
            let role = resolve_role(roles, &user.uid).await;
            if role == required {
                Decision::Allow
            } else {
                tracing::info!(uid = %user.uid, %role, %required, path = target, "Role mismatch on navigation");
                Decision::redirect(LANDING_PATH)
            }
        }
        _ => Decision::Allow,
    }
}
