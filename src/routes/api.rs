// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::{authorize_user_scope, AuthUser};
use crate::models::intake::sum_macros;
use crate::models::{Goals, GoalsPatch, IntakeEntry, MacroTotals, NewIntakeEntry, Progress, Role};
use crate::services::navigation::resolve_role;
use crate::time_utils::{day_window, now_millis, DayWindow};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via ID token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/users/{uid}/goals", get(get_goals).put(update_goals))
        .route("/api/users/{uid}/intake", post(add_intake))
        .route("/api/users/{uid}/intake/today", get(get_today_intake))
        .route("/api/users/{uid}/progress", get(get_progress))
}

/// Admin-only routes. Wrapped with `require_admin` in routes/mod.rs.
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/admin/users/{uid}/role", put(set_role))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub uid: String,
    pub email: Option<String>,
    pub role: Role,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<UserResponse> {
    let role = resolve_role(state.roles.as_ref(), &user.uid).await;
    Json(UserResponse {
        uid: user.uid,
        email: user.email,
        role,
    })
}

// ─── Goals ───────────────────────────────────────────────────

async fn get_goals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
) -> Result<Json<Goals>> {
    authorize_user_scope(&state, &user, &uid).await?;
    let goals = state.db.get_goals(&uid).await?.unwrap_or_default();
    Ok(Json(goals))
}

/// Merge the payload over the stored goals.
async fn update_goals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
    Json(patch): Json<GoalsPatch>,
) -> Result<Json<Goals>> {
    authorize_user_scope(&state, &user, &uid).await?;
    patch.validate()?;

    let current = state.db.get_goals(&uid).await?.unwrap_or_default();
    let merged = current.merged(&patch);
    state.db.set_goals(&uid, &merged).await?;

    tracing::info!(uid = %uid, by = %user.uid, "Goals updated");
    Ok(Json(merged))
}

// ─── Intake ──────────────────────────────────────────────────

async fn add_intake(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
    Json(new_entry): Json<NewIntakeEntry>,
) -> Result<(StatusCode, Json<IntakeEntry>)> {
    authorize_user_scope(&state, &user, &uid).await?;
    new_entry.validate()?;

    let entry = new_entry.into_entry(now_millis());
    state.db.add_intake(&uid, &entry).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Deserialize)]
struct DayQuery {
    /// Local calendar day (`YYYY-MM-DD`); defaults to today.
    date: Option<String>,
    /// Minutes east of UTC.
    #[serde(default)]
    tz_offset_minutes: i32,
}

impl DayQuery {
    fn window(&self) -> Result<DayWindow> {
        let date = self
            .date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
            .transpose()
            .map_err(|_| AppError::BadRequest("date must be YYYY-MM-DD".to_string()))?;

        day_window(date, self.tz_offset_minutes, Utc::now()).ok_or_else(|| {
            AppError::BadRequest("tz_offset_minutes must be within ±840".to_string())
        })
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TodayIntakeResponse {
    pub date: String,
    pub entries: Vec<IntakeEntry>,
    pub totals: MacroTotals,
}

async fn get_today_intake(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
    Query(query): Query<DayQuery>,
) -> Result<Json<TodayIntakeResponse>> {
    authorize_user_scope(&state, &user, &uid).await?;
    let window = query.window()?;

    let entries = state
        .db
        .get_intake_between(&uid, window.start_ms, window.end_ms)
        .await?;
    let totals = sum_macros(&entries);

    Ok(Json(TodayIntakeResponse {
        date: window.date.to_string(),
        entries,
        totals,
    }))
}

// ─── Progress ────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressResponse {
    pub date: String,
    pub goals: Goals,
    pub totals: MacroTotals,
    pub pct: Progress,
    pub tips: Vec<String>,
}

async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(uid): Path<String>,
    Query(query): Query<DayQuery>,
) -> Result<Json<ProgressResponse>> {
    authorize_user_scope(&state, &user, &uid).await?;
    let window = query.window()?;

    let goals = state.db.get_goals(&uid).await?.unwrap_or_default();
    let entries = state
        .db
        .get_intake_between(&uid, window.start_ms, window.end_ms)
        .await?;
    let totals = sum_macros(&entries);

    Ok(Json(ProgressResponse {
        date: window.date.to_string(),
        pct: goals.progress(&totals),
        tips: goals.tips(&totals).into_iter().map(str::to_string).collect(),
        goals,
        totals,
    }))
}

// ─── Admin ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SetRoleRequest {
    role: String,
}

#[derive(Serialize)]
pub struct SetRoleResponse {
    pub uid: String,
    pub role: Role,
}

async fn set_role(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(uid): Path<String>,
    Json(request): Json<SetRoleRequest>,
) -> Result<Json<SetRoleResponse>> {
    let role: Role = request.role.parse().map_err(AppError::BadRequest)?;

    state.db.set_user_role(&uid, role).await?;
    tracing::info!(uid = %uid, role = %role, by = %admin.uid, "Role assigned");

    Ok(Json(SetRoleResponse { uid, role }))
}
