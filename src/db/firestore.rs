// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! All documents live under the owning user's namespace:
//! - `users/{uid}` (profile, role)
//! - `users/{uid}/settings/goals`
//! - `users/{uid}/intake/{entry}`

use crate::db::{collections, GOALS_DOC_ID};
use crate::error::AppError;
use crate::models::{Goals, IntakeEntry, Role, UserProfile};
use crate::services::navigation::RoleSource;
use crate::time_utils::format_utc_rfc3339;
use async_trait::async_trait;
use firestore::paths;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator does not check credentials; skip ADC lookup entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Path of `users/{uid}`, used as the parent of per-user collections.
    fn user_path(&self, uid: &str) -> Result<firestore::ParentPathBuilder, AppError> {
        validate_uid(uid)?;
        self.get_client()?
            .parent_path(collections::USERS, uid)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── User Profile Operations ─────────────────────────────────

    /// Get a user's profile document.
    pub async fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        validate_uid(uid)?;
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set a user's role. Only `role` and `created_at` are written; other
    /// fields on the profile document are left as they are.
    pub async fn set_user_role(&self, uid: &str, role: Role) -> Result<UserProfile, AppError> {
        let mut profile = self.get_user_profile(uid).await?.unwrap_or_default();
        profile.role = Some(role.to_string());
        if profile.created_at.is_none() {
            profile.created_at = Some(format_utc_rfc3339(chrono::Utc::now()));
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths!(UserProfile::{role, created_at}))
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(uid, role = %role, "User role updated");
        Ok(profile)
    }

    // ─── Goals Operations ────────────────────────────────────────

    /// Get the user's daily goals, if they have saved any.
    pub async fn get_goals(&self, uid: &str) -> Result<Option<Goals>, AppError> {
        let parent = self.user_path(uid)?;
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SETTINGS)
            .parent(&parent)
            .obj()
            .one(GOALS_DOC_ID)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the user's daily goals.
    pub async fn set_goals(&self, uid: &str, goals: &Goals) -> Result<(), AppError> {
        let parent = self.user_path(uid)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SETTINGS)
            .document_id(GOALS_DOC_ID)
            .parent(&parent)
            .object(goals)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Intake Operations ───────────────────────────────────────

    /// Append an intake entry under a generated document ID.
    pub async fn add_intake(&self, uid: &str, entry: &IntakeEntry) -> Result<(), AppError> {
        let parent = self.user_path(uid)?;
        let _: IntakeEntry = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::INTAKE)
            .generate_document_id()
            .parent(&parent)
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(uid, ts = entry.ts, "Intake entry stored");
        Ok(())
    }

    /// Intake entries with `start_ms <= ts < end_ms`, oldest first.
    pub async fn get_intake_between(
        &self,
        uid: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<IntakeEntry>, AppError> {
        let parent = self.user_path(uid)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collections::INTAKE)
            .parent(&parent)
            .filter(move |q| {
                q.for_all([
                    q.field("ts").greater_than_or_equal(start_ms),
                    q.field("ts").less_than(end_ms),
                ])
            })
            .order_by([("ts", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Reject IDs that would escape `users/{uid}` or name no document.
fn validate_uid(uid: &str) -> Result<(), AppError> {
    if uid.is_empty() || uid.contains('/') {
        return Err(AppError::BadRequest(format!("Invalid user id: {uid:?}")));
    }
    Ok(())
}

#[async_trait]
impl RoleSource for FirestoreDb {
    async fn role_of(&self, uid: &str) -> Result<Option<Role>, AppError> {
        Ok(self
            .get_user_profile(uid)
            .await?
            .map(|profile| profile.effective_role()))
    }
}
