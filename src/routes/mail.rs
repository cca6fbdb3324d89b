// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transactional mail endpoint.
//!
//! Callable from any origin without credentials, so it carries its own
//! permissive CORS headers instead of the API's `CorsLayer`.

use crate::error::AppError;
use crate::services::mail::{Attachment, OutgoingMail};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/sendEmail", any(send_email))
}

#[derive(Debug, Serialize)]
struct MailResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn reply(status: StatusCode, error: Option<String>) -> Response {
    let body = MailResponse {
        ok: error.is_none(),
        error,
    };
    with_cors((status, Json(body)).into_response())
}

fn fail(status: StatusCode, error: impl Into<String>) -> Response {
    reply(status, Some(error.into()))
}

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

/// Fields of a mail request after alias resolution.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MailRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub text: String,
    pub storage_path: Option<String>,
}

impl MailRequest {
    /// Parse a raw body. Anything that is not a JSON object reads as empty.
    pub fn from_body(raw: &[u8]) -> Self {
        let fields = match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                if !raw.is_empty() {
                    tracing::warn!(len = raw.len(), "Mail request body is not a JSON object");
                }
                Map::new()
            }
        };

        Self {
            to: non_empty(first_present(&fields, &["to", "recipient", "email"])),
            subject: non_empty(first_present(&fields, &["subject"])),
            text: first_present(&fields, &["text", "message"])
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            storage_path: non_empty(first_present(&fields, &["storagePath"])),
        }
    }
}

/// First key whose value is present and not null.
fn first_present<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_null())
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

async fn send_email(State(state): State<Arc<AppState>>, method: Method, body: Bytes) -> Response {
    if method == Method::OPTIONS {
        return with_cors(StatusCode::NO_CONTENT.into_response());
    }
    if method != Method::POST {
        return fail(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let Some((api_key, from)) = state.config.mail.credentials() else {
        tracing::error!(
            has_key = state.config.mail.api_key.is_some(),
            has_from = state.config.mail.from.is_some(),
            "Missing SendGrid config"
        );
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Missing SendGrid config");
    };

    let request = MailRequest::from_body(&body);
    let (Some(to), Some(subject)) = (request.to, request.subject) else {
        tracing::warn!("Mail request missing recipient or subject");
        return fail(StatusCode::BAD_REQUEST, "Missing to/subject");
    };

    let mut attachments = Vec::new();
    if let Some(path) = request.storage_path.as_deref() {
        match load_attachment(&state, path).await {
            Ok(Some(attachment)) => attachments.push(attachment),
            Ok(None) => {
                tracing::warn!(path, "Attachment not found");
                return fail(StatusCode::BAD_REQUEST, "Attachment not found");
            }
            Err(e) => {
                tracing::error!(path, error = %e, "Failed to load attachment");
                return fail(StatusCode::INTERNAL_SERVER_ERROR, e.client_message());
            }
        }
    }

    let mail = OutgoingMail {
        to,
        from: from.to_string(),
        subject,
        text: request.text,
        attachments,
    };

    tracing::info!(
        to = %mail.to,
        subject = %mail.subject,
        attachments = mail.attachments.len(),
        "Sending mail"
    );

    match state.mailer.send(api_key, &mail).await {
        Ok(receipt) => {
            tracing::info!(
                status = receipt.status,
                message_id = receipt.message_id.as_deref().unwrap_or(""),
                "Mail accepted"
            );
            reply(StatusCode::OK, None)
        }
        Err(e) => {
            tracing::error!(error = %e, "Mail send failed");
            let message = match e {
                AppError::MailApi(msg) if !msg.is_empty() => msg,
                _ => "Send failed".to_string(),
            };
            fail(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

/// Fetch and encode a stored object. `Ok(None)` if it does not exist.
async fn load_attachment(state: &AppState, path: &str) -> Result<Option<Attachment>, AppError> {
    let store = state
        .storage
        .as_ref()
        .ok_or_else(|| AppError::Config("Missing storage bucket config".to_string()))?;

    let Some(object) = store.metadata(path).await? else {
        return Ok(None);
    };
    let bytes = store.download(path).await?;

    Ok(Some(Attachment {
        content: STANDARD.encode(bytes),
        filename: object.file_name(path).to_string(),
        content_type: object
            .content_type
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        disposition: "attachment".to_string(),
    }))
}
