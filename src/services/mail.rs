// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outgoing mail through the SendGrid v3 API.

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Attachment in SendGrid's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// Base64-encoded file content
    pub content: String,
    pub filename: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub disposition: String,
}

/// A message ready to hand to the mail API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl OutgoingMail {
    /// Request body for `POST /v3/mail/send`.
    pub fn to_sendgrid_body(&self) -> serde_json::Value {
        let mut body = json!({
            "personalizations": [{ "to": [{ "email": self.to }] }],
            "from": { "email": self.from },
            "subject": self.subject,
            "content": [{ "type": "text/plain", "value": self.text }],
        });
        if !self.attachments.is_empty() {
            body["attachments"] = json!(self.attachments);
        }
        body
    }
}

/// Result of an accepted send.
#[derive(Debug, Clone, Default)]
pub struct MailReceipt {
    pub status: u16,
    pub message_id: Option<String>,
}

/// Something that can deliver mail.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver `mail` using `api_key`. Errors carry the upstream message.
    async fn send(&self, api_key: &str, mail: &OutgoingMail) -> Result<MailReceipt, AppError>;
}

#[derive(Debug, Deserialize)]
struct SendGridErrorBody {
    #[serde(default)]
    errors: Vec<SendGridErrorItem>,
}

#[derive(Debug, Deserialize)]
struct SendGridErrorItem {
    #[serde(default)]
    message: Option<String>,
}

/// SendGrid HTTP client.
pub struct SendGridClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SendGridClient {
    pub fn new(base_url: &str) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default SendGrid HTTP client");
                reqwest::Client::new()
            });

        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Upstream error message from a SendGrid error response.
fn sendgrid_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let messages: Vec<String> = serde_json::from_str::<SendGridErrorBody>(body)
        .map(|parsed| parsed.errors.into_iter().filter_map(|e| e.message).collect())
        .unwrap_or_default();

    if messages.is_empty() {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("SendGrid returned {status}"))
    } else {
        messages.join("; ")
    }
}

#[async_trait]
impl MailTransport for SendGridClient {
    async fn send(&self, api_key: &str, mail: &OutgoingMail) -> Result<MailReceipt, AppError> {
        let url = format!("{}/v3/mail/send", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&mail.to_sendgrid_body())
            .send()
            .await
            .map_err(|e| AppError::MailApi(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MailApi(sendgrid_error_message(status, &body)));
        }

        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(MailReceipt {
            status: status.as_u16(),
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(attachments: Vec<Attachment>) -> OutgoingMail {
        OutgoingMail {
            to: "eater@example.com".to_string(),
            from: "noreply@example.com".to_string(),
            subject: "Weekly report".to_string(),
            text: String::new(),
            attachments,
        }
    }

    #[test]
    fn body_without_attachments() {
        let body = mail(vec![]).to_sendgrid_body();
        assert_eq!(
            body["personalizations"][0]["to"][0]["email"],
            "eater@example.com"
        );
        assert_eq!(body["from"]["email"], "noreply@example.com");
        assert_eq!(body["content"][0]["value"], "");
        assert!(body.get("attachments").is_none());
    }

    #[test]
    fn body_with_attachment_uses_type_key() {
        let body = mail(vec![Attachment {
            content: "aGk=".to_string(),
            filename: "report.csv".to_string(),
            content_type: "text/csv".to_string(),
            disposition: "attachment".to_string(),
        }])
        .to_sendgrid_body();
        assert_eq!(body["attachments"][0]["type"], "text/csv");
        assert_eq!(body["attachments"][0]["disposition"], "attachment");
    }

    #[test]
    fn error_message_prefers_upstream_errors() {
        let body = r#"{"errors":[{"message":"The from address does not match a verified Sender Identity."}]}"#;
        assert_eq!(
            sendgrid_error_message(reqwest::StatusCode::FORBIDDEN, body),
            "The from address does not match a verified Sender Identity."
        );
        assert_eq!(
            sendgrid_error_message(reqwest::StatusCode::UNAUTHORIZED, "not json"),
            "Unauthorized"
        );
    }
}
