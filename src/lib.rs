// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nutrition Tracker: daily goals, intake logging and food lookup
//!
//! This crate provides the backend API: Firebase ID token authentication,
//! page access policy, USDA FoodData Central search, and transactional
//! mail through SendGrid.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{FirebaseTokenVerifier, MailTransport, ObjectStore, RoleSource, UsdaClient};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub token_verifier: Arc<FirebaseTokenVerifier>,
    /// Role lookups for access checks (backed by `db` in production).
    pub roles: Arc<dyn RoleSource>,
    pub usda: UsdaClient,
    /// Attachment bucket; `None` when no bucket is configured.
    pub storage: Option<Arc<dyn ObjectStore>>,
    pub mailer: Arc<dyn MailTransport>,
}
