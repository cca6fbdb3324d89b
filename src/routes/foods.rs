// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Food search routes (public).

use crate::error::Result;
use crate::models::FoodItem;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/foods/search", get(search_foods))
        .route("/api/foods/{fdc_id}", get(get_food))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    query: String,
    page_size: Option<usize>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FoodSearchResponse {
    pub items: Vec<FoodItem>,
}

async fn search_foods(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<FoodSearchResponse>> {
    let items = state
        .usda
        .search_foods(&params.query, params.page_size)
        .await?;
    Ok(Json(FoodSearchResponse { items }))
}

async fn get_food(
    State(state): State<Arc<AppState>>,
    Path(fdc_id): Path<u64>,
) -> Result<Json<FoodItem>> {
    Ok(Json(state.usda.food_item(fdc_id).await?))
}
