// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Mail credentials can come from two places: the `SENDGRID_*` environment
//! variables (bound from Secret Manager on Cloud Run) or the legacy
//! runtime-config JSON (`{"sendgrid": {"key": ..., "from": ...}}`).
//! `MAIL_CONFIG_SOURCE` picks which one is consulted.

use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub const DEFAULT_USDA_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
pub const DEFAULT_SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";
const LEGACY_RUNTIME_CONFIG_FILE: &str = ".runtimeconfig.json";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase / GCP project ID (ID token audience, Firestore project)
    pub firebase_project_id: String,
    /// Frontend URL (allowed CORS origin)
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// USDA FoodData Central API key
    pub usda_api_key: Option<String>,
    pub usda_base_url: String,
    /// Cloud Storage bucket holding mail attachments
    pub storage_bucket: Option<String>,
    pub mail: MailConfig,
}

/// Resolved SendGrid settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: Option<String>,
    pub from: Option<String>,
    pub base_url: String,
}

impl MailConfig {
    /// API key and sender, if both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.api_key.as_deref(), self.from.as_deref()) {
            (Some(key), Some(from)) => Some((key, from)),
            _ => None,
        }
    }
}

/// Where mail credentials are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailConfigSource {
    /// `SENDGRID_API_KEY` / `SENDGRID_FROM` only.
    Env,
    /// Legacy runtime-config JSON only.
    Legacy,
    /// Environment per field, legacy config as fallback.
    Auto,
}

impl FromStr for MailConfigSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "env" => Ok(Self::Env),
            "legacy" => Ok(Self::Legacy),
            "auto" | "" => Ok(Self::Auto),
            _ => Err(ConfigError::Invalid("MAIL_CONFIG_SOURCE")),
        }
    }
}

/// `sendgrid` section of the legacy runtime config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacySendgridConfig {
    pub key: Option<String>,
    pub from: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyRuntimeConfig {
    #[serde(default)]
    sendgrid: Option<LegacySendgridConfig>,
}

impl Config {
    /// Default config for tests.
    pub fn test_default() -> Self {
        Self {
            firebase_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            usda_api_key: Some("test_usda_key".to_string()),
            usda_base_url: DEFAULT_USDA_BASE_URL.to_string(),
            storage_bucket: Some("test-bucket".to_string()),
            mail: MailConfig {
                api_key: Some("test_sendgrid_key".to_string()),
                from: Some("noreply@example.com".to_string()),
                base_url: DEFAULT_SENDGRID_BASE_URL.to_string(),
            },
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mail_source = env::var("MAIL_CONFIG_SOURCE")
            .unwrap_or_default()
            .parse::<MailConfigSource>()?;

        let legacy = if mail_source == MailConfigSource::Env {
            None
        } else {
            load_legacy_sendgrid()
        };

        let mail = resolve_mail_config(
            mail_source,
            non_empty_env("SENDGRID_API_KEY"),
            non_empty_env("SENDGRID_FROM"),
            legacy,
            non_empty_env("SENDGRID_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SENDGRID_BASE_URL.to_string()),
        );

        Ok(Self {
            firebase_project_id: non_empty_env("FIREBASE_PROJECT_ID")
                .or_else(|| non_empty_env("GCP_PROJECT_ID"))
                .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            usda_api_key: non_empty_env("USDA_API_KEY"),
            usda_base_url: non_empty_env("USDA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_USDA_BASE_URL.to_string()),
            storage_bucket: non_empty_env("STORAGE_BUCKET"),
            mail,
        })
    }
}

/// Combine environment and legacy mail settings according to `source`.
pub fn resolve_mail_config(
    source: MailConfigSource,
    env_key: Option<String>,
    env_from: Option<String>,
    legacy: Option<LegacySendgridConfig>,
    base_url: String,
) -> MailConfig {
    let legacy = legacy.unwrap_or_default();
    let legacy_key = legacy.key.filter(|v| !v.trim().is_empty());
    let legacy_from = legacy.from.filter(|v| !v.trim().is_empty());

    let (api_key, from) = match source {
        MailConfigSource::Env => (env_key, env_from),
        MailConfigSource::Legacy => (legacy_key, legacy_from),
        MailConfigSource::Auto => {
            if env_key.is_some() && legacy_key.is_some() && env_key != legacy_key {
                tracing::warn!("SendGrid key differs between environment and legacy config; using environment");
            }
            (env_key.or(legacy_key), env_from.or(legacy_from))
        }
    };

    MailConfig {
        api_key: api_key.map(|v| v.trim().to_string()),
        from: from.map(|v| v.trim().to_string()),
        base_url,
    }
}

/// Parse the `sendgrid` section out of a legacy runtime-config document.
pub fn parse_legacy_sendgrid(raw: &str) -> Option<LegacySendgridConfig> {
    match serde_json::from_str::<LegacyRuntimeConfig>(raw) {
        Ok(config) => config.sendgrid,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unparseable legacy runtime config");
            None
        }
    }
}

fn load_legacy_sendgrid() -> Option<LegacySendgridConfig> {
    if let Some(raw) = non_empty_env("CLOUD_RUNTIME_CONFIG") {
        return parse_legacy_sendgrid(&raw);
    }
    std::fs::read_to_string(LEGACY_RUNTIME_CONFIG_FILE)
        .ok()
        .and_then(|raw| parse_legacy_sendgrid(&raw))
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
