// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Storage access for mail attachments.

use crate::error::AppError;
use async_trait::async_trait;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::Error as GcsError;

/// Metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Full object name (path within the bucket)
    pub name: String,
    pub content_type: Option<String>,
}

impl StoredObject {
    /// Last path segment of the object name, or of `fallback_path` if the
    /// name is empty.
    pub fn file_name<'a>(&'a self, fallback_path: &'a str) -> &'a str {
        let source = if self.name.is_empty() {
            fallback_path
        } else {
            &self.name
        };
        source.rsplit('/').next().unwrap_or(source)
    }
}

/// Read access to a single bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// `Ok(None)` if no object exists at `path`.
    async fn metadata(&self, path: &str) -> Result<Option<StoredObject>, AppError>;

    async fn download(&self, path: &str) -> Result<Vec<u8>, AppError>;
}

/// Google Cloud Storage bucket.
pub struct GcsObjectStore {
    client: Client,
    bucket: String,
}

impl GcsObjectStore {
    /// Create a client using Application Default Credentials.
    pub async fn new(bucket: &str) -> Result<Self, AppError> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to initialize storage auth: {e}")))?;

        tracing::info!(bucket, "Cloud Storage client initialized");

        Ok(Self {
            client: Client::new(config),
            bucket: bucket.to_string(),
        })
    }

    fn request(&self, path: &str) -> GetObjectRequest {
        GetObjectRequest {
            bucket: self.bucket.clone(),
            object: path.to_string(),
            ..Default::default()
        }
    }
}

fn is_not_found(err: &GcsError) -> bool {
    matches!(err, GcsError::Response(resp) if resp.code == 404)
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn metadata(&self, path: &str) -> Result<Option<StoredObject>, AppError> {
        match self.client.get_object(&self.request(path)).await {
            Ok(object) => Ok(Some(StoredObject {
                name: object.name,
                content_type: object.content_type,
            })),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read metadata for {path}: {e}"
            ))),
        }
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, AppError> {
        self.client
            .download_object(&self.request(path), &Range::default())
            .await
            .map_err(|e| AppError::Storage(format!("Failed to download {path}: {e}")))
    }
}
