// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nutrition Tracker API Server
//!
//! Serves goals, intake and progress for signed-in users, food search
//! against USDA FoodData Central, and the transactional mail endpoint.

use nutrition_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{FirebaseTokenVerifier, GcsObjectStore, ObjectStore, SendGridClient, UsdaClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Nutrition Tracker API");

    let db = FirestoreDb::new(&config.firebase_project_id).await?;

    let token_verifier = Arc::new(FirebaseTokenVerifier::new(&config.firebase_project_id)?);

    let usda = UsdaClient::new(&config.usda_base_url, config.usda_api_key.clone());
    if config.usda_api_key.is_none() {
        tracing::warn!("USDA_API_KEY not set; food search will fail");
    }

    let storage: Option<Arc<dyn ObjectStore>> = match config.storage_bucket.as_deref() {
        Some(bucket) => Some(Arc::new(GcsObjectStore::new(bucket).await?)),
        None => {
            tracing::warn!("STORAGE_BUCKET not set; mail attachments are disabled");
            None
        }
    };

    if config.mail.credentials().is_none() {
        tracing::warn!("SendGrid credentials not configured; /sendEmail will fail");
    }
    let mailer = Arc::new(SendGridClient::new(&config.mail.base_url));

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        roles: Arc::new(db.clone()),
        db,
        token_verifier,
        usda,
        storage,
        mailer,
    });

    // Build router
    let app = nutrition_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nutrition_tracker=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
