// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod firebase_auth;
pub mod mail;
pub mod navigation;
pub mod nutrition;
pub mod storage;
pub mod usda;

pub use firebase_auth::{FirebaseTokenVerifier, TokenError, VerifiedUser};
pub use mail::{MailTransport, SendGridClient};
pub use navigation::{RoleSource, Session};
pub use storage::{GcsObjectStore, ObjectStore};
pub use usda::UsdaClient;
