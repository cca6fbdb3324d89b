// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use nutrition_tracker::config::Config;
use nutrition_tracker::db::FirestoreDb;
use nutrition_tracker::error::AppError;
use nutrition_tracker::models::Role;
use nutrition_tracker::routes::create_router;
use nutrition_tracker::services::mail::{MailReceipt, MailTransport, OutgoingMail};
use nutrition_tracker::services::storage::{ObjectStore, StoredObject};
use nutrition_tracker::services::{FirebaseTokenVerifier, RoleSource, UsdaClient};
use nutrition_tracker::AppState;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// HS256 secret accepted by the test token verifier.
#[allow(dead_code)]
pub const TEST_TOKEN_SECRET: &[u8] = b"integration_test_secret_32_bytes";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create an ID token for `uid` that the test verifier accepts.
#[allow(dead_code)]
pub fn id_token(uid: &str) -> String {
    id_token_for_project(uid, &Config::test_default().firebase_project_id)
}

#[allow(dead_code)]
pub fn id_token_for_project(uid: &str, project: &str) -> String {
    #[derive(Serialize)]
    struct Claims<'a> {
        iss: String,
        aud: &'a str,
        sub: &'a str,
        iat: u64,
        exp: u64,
        email: String,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let claims = Claims {
        iss: format!("https://securetoken.google.com/{project}"),
        aud: project,
        sub: uid,
        iat: now,
        exp: now + 3600,
        email: format!("{uid}@example.com"),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_TOKEN_SECRET),
    )
    .unwrap()
}

/// Fixed role assignments. Users not listed have no profile document.
#[allow(dead_code)]
#[derive(Default)]
pub struct StaticRoles {
    roles: HashMap<String, Role>,
    fail: bool,
}

#[allow(dead_code)]
impl StaticRoles {
    pub fn with(roles: &[(&str, Role)]) -> Self {
        Self {
            roles: roles
                .iter()
                .map(|(uid, role)| (uid.to_string(), *role))
                .collect(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            roles: HashMap::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl RoleSource for StaticRoles {
    async fn role_of(&self, uid: &str) -> Result<Option<Role>, AppError> {
        if self.fail {
            return Err(AppError::Database("role store unavailable".to_string()));
        }
        Ok(self.roles.get(uid).copied())
    }
}

/// Object store backed by a map, counting metadata lookups.
#[allow(dead_code)]
#[derive(Default)]
pub struct InMemoryStore {
    objects: HashMap<String, (StoredObject, Vec<u8>)>,
    pub lookups: AtomicUsize,
}

#[allow(dead_code)]
impl InMemoryStore {
    pub fn with_object(mut self, path: &str, content_type: Option<&str>, bytes: &[u8]) -> Self {
        self.objects.insert(
            path.to_string(),
            (
                StoredObject {
                    name: path.to_string(),
                    content_type: content_type.map(str::to_string),
                },
                bytes.to_vec(),
            ),
        );
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn metadata(&self, path: &str) -> Result<Option<StoredObject>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.objects.get(path).map(|(meta, _)| meta.clone()))
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, AppError> {
        self.objects
            .get(path)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| AppError::Storage(format!("no object at {path}")))
    }
}

/// Mail transport that records messages instead of sending them.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, OutgoingMail)>>,
    failure: Option<String>,
}

#[allow(dead_code)]
impl RecordingMailer {
    pub fn failing(message: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    /// `(api_key, mail)` pairs handed to the transport.
    pub fn sent(&self) -> Vec<(String, OutgoingMail)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, api_key: &str, mail: &OutgoingMail) -> Result<MailReceipt, AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((api_key.to_string(), mail.clone()));
        match &self.failure {
            Some(message) => Err(AppError::MailApi(message.clone())),
            None => Ok(MailReceipt {
                status: 202,
                message_id: Some("test-message".to_string()),
            }),
        }
    }
}

/// Offline dependencies for a test app.
#[allow(dead_code)]
pub struct TestDeps {
    pub config: Config,
    pub roles: StaticRoles,
    pub store: Option<InMemoryStore>,
    pub mailer: RecordingMailer,
}

impl Default for TestDeps {
    fn default() -> Self {
        Self {
            config: Config::test_default(),
            roles: StaticRoles::default(),
            store: Some(InMemoryStore::default()),
            mailer: RecordingMailer::default(),
        }
    }
}

/// Router plus handles on the fakes behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Option<Arc<InMemoryStore>>,
    pub mailer: Arc<RecordingMailer>,
}

/// Create a test app with offline mock dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(TestDeps::default())
}

#[allow(dead_code)]
pub fn create_test_app_with(deps: TestDeps) -> TestApp {
    let token_verifier = Arc::new(
        FirebaseTokenVerifier::new_with_shared_secret(
            &deps.config.firebase_project_id,
            TEST_TOKEN_SECRET,
        )
        .unwrap(),
    );
    let usda = UsdaClient::new(&deps.config.usda_base_url, deps.config.usda_api_key.clone());
    let store = deps.store.map(Arc::new);
    let mailer = Arc::new(deps.mailer);

    let state = Arc::new(AppState {
        config: deps.config,
        db: FirestoreDb::new_mock(),
        token_verifier,
        roles: Arc::new(deps.roles),
        usda,
        storage: store.clone().map(|s| s as Arc<dyn ObjectStore>),
        mailer: mailer.clone(),
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        mailer,
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
