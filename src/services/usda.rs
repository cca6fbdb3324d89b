// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! USDA FoodData Central client.
//!
//! API Reference: <https://fdc.nal.usda.gov/api-guide.html>

use crate::error::AppError;
use crate::models::{FoodItem, Per100};
use crate::services::nutrition::{self, FoodRecord};
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 200;

/// Data types tried first; branded foods are the fallback.
const PRIMARY_DATA_TYPES: &str = "Foundation,SR Legacy";
const FALLBACK_DATA_TYPES: &str = "Branded";
const ERROR_BODY_SNIPPET_CHARS: usize = 160;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Option<Vec<Value>>,
}

/// FoodData Central API client.
#[derive(Clone)]
pub struct UsdaClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl UsdaClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default USDA HTTP client");
                reqwest::Client::new()
            });

        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("Missing USDA API key".to_string()))
    }

    /// Search foods and normalize them to per-100 g macros.
    ///
    /// Results are sorted by name and truncated to `page_size`.
    pub async fn search_foods(
        &self,
        query: &str,
        page_size: Option<usize>,
    ) -> Result<Vec<FoodItem>, AppError> {
        let api_key = self.api_key()?;

        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::BadRequest(
                "Search query cannot be empty".to_string(),
            ));
        }

        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(AppError::BadRequest(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let mut items = self
            .search_data_types(api_key, query, page_size, PRIMARY_DATA_TYPES)
            .await?;
        if items.is_empty() {
            tracing::debug!(query, "No usable primary results; trying branded foods");
            items = self
                .search_data_types(api_key, query, page_size, FALLBACK_DATA_TYPES)
                .await?;
        }

        nutrition::sort_items(&mut items);
        items.truncate(page_size);

        tracing::info!(query, count = items.len(), "Food search complete");
        Ok(items)
    }

    /// One search call plus enrichment of each hit.
    async fn search_data_types(
        &self,
        api_key: &str,
        query: &str,
        page_size: usize,
        data_types: &str,
    ) -> Result<Vec<FoodItem>, AppError> {
        let records = self
            .search_page(api_key, query, page_size, data_types)
            .await?;

        let items: Vec<FoodItem> = stream::iter(records.into_iter().take(page_size))
            .map(|record| self.enrich(api_key, record))
            .buffer_unordered(page_size)
            .filter_map(|item| async move { item })
            .collect()
            .await;

        Ok(items)
    }

    async fn search_page(
        &self,
        api_key: &str,
        query: &str,
        page_size: usize,
        data_types: &str,
    ) -> Result<Vec<FoodRecord>, AppError> {
        let url = format!("{}/foods/search", self.base_url);
        let page_size_param = page_size.to_string();
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", api_key),
                ("query", query),
                ("pageSize", page_size_param.as_str()),
                ("dataType", data_types),
            ])
            .send()
            .await
            .map_err(|e| AppError::UsdaApi(format!("USDA API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UsdaApi(upstream_error_message(status, &body)));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::UsdaApi(format!("Invalid USDA search response: {e}")))?;

        let records = search
            .foods
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<FoodRecord>(raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed food record");
                    None
                }
            })
            .collect();

        Ok(records)
    }

    /// Fetch `/food/{fdc_id}`. `Ok(None)` when USDA has no such food.
    async fn get_food(&self, api_key: &str, fdc_id: u64) -> Result<Option<FoodRecord>, AppError> {
        let url = format!("{}/food/{fdc_id}", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", api_key)])
            .send()
            .await
            .map_err(|e| AppError::UsdaApi(format!("USDA API request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UsdaApi(upstream_error_message(status, &body)));
        }

        let record = response
            .json()
            .await
            .map_err(|e| AppError::UsdaApi(format!("Invalid USDA food response: {e}")))?;
        Ok(Some(record))
    }

    /// Label-derived estimate from the detail record. Failures yield `None`.
    async fn detail_per100(&self, api_key: &str, fdc_id: u64) -> Option<Per100> {
        match self.get_food(api_key, fdc_id).await {
            Ok(Some(detail)) => nutrition::per100_from_label(&detail),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(fdc_id, error = %e, "Detail lookup failed");
                None
            }
        }
    }

    async fn enrich(&self, api_key: &str, record: FoodRecord) -> Option<FoodItem> {
        let per100 = match nutrition::estimate_per100(&record) {
            Some(per100) => Some(per100),
            None => self.detail_per100(api_key, record.fdc_id).await,
        };
        nutrition::food_item(&record, per100)
    }

    /// Normalized record for a single food.
    pub async fn food_item(&self, fdc_id: u64) -> Result<FoodItem, AppError> {
        let api_key = self.api_key()?;

        let record = self
            .get_food(api_key, fdc_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Food {fdc_id} not found")))?;

        nutrition::food_item(&record, nutrition::estimate_per100(&record))
            .ok_or_else(|| AppError::NotFound(format!("No nutrition data for food {fdc_id}")))
    }
}

/// Status line plus the first 160 characters of the response body.
fn upstream_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let snippet: String = body.chars().take(ERROR_BODY_SNIPPET_CHARS).collect();
    format!("USDA API {status} — {snippet}")
}
