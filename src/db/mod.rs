// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Per-user settings subcollection (`users/{uid}/settings`)
    pub const SETTINGS: &str = "settings";
    /// Per-user intake log (`users/{uid}/intake`)
    pub const INTAKE: &str = "intake";
}

/// Document ID of the goals document inside `settings`.
pub const GOALS_DOC_ID: &str = "goals";
