//! Transactional message requests and the queued-delivery response.

use crate::{codec, device::Device, identifier::Identifier, Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Read;

/// The result of queueing a transactional email, push or SMS.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionalResponse {
    pub delivery_id: String,
    /// When the message was queued, sent on the wire as epoch seconds.
    #[serde(deserialize_with = "codec::epoch_seconds")]
    pub queued_at: DateTime<Utc>,
    #[serde(default)]
    pub recipient: Option<String>,
}

/// A transactional email.
///
/// Optional fields left as `None` are not sent.
///
/// # Examples
///
/// ```no_run
/// use customerio::{ApiClient, Identifier, SendEmailRequest};
/// use std::fs::File;
///
/// # async fn example() -> Result<(), customerio::Error> {
/// let client = ApiClient::new("app-key")?;
///
/// let mut request = SendEmailRequest {
///     transactional_message_id: Some("welcome".to_string()),
///     to: Some("customer@example.com".to_string()),
///     ..SendEmailRequest::new(Identifier::id("customer_1"))
/// };
/// request.attach("invoice.pdf", File::open("invoice.pdf")?)?;
///
/// let response = client.send_email(&request).await?;
/// println!("queued {} at {}", response.delivery_id, response.queued_at);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendEmailRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactional_message_id: Option<String>,
    pub identifiers: Identifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preheader: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaintext_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amp_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fake_bcc: Option<bool>,
    /// File name to base64 content. Use [`attach`](Self::attach) to add entries.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attachments: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_message_retention: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_to_unsubscribed: Option<bool>,
    #[serde(rename = "tracked", skip_serializing_if = "Option::is_none")]
    pub enable_tracking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_draft: Option<bool>,
}

impl SendEmailRequest {
    pub fn new(identifiers: Identifier) -> Self {
        Self {
            transactional_message_id: None,
            identifiers,
            message_data: None,
            headers: None,
            from: None,
            from_id: None,
            to: None,
            reply_to: None,
            reply_to_id: None,
            bcc: None,
            subject: None,
            preheader: None,
            body: None,
            plaintext_body: None,
            amp_body: None,
            fake_bcc: None,
            attachments: BTreeMap::new(),
            disable_message_retention: None,
            send_to_unsubscribed: None,
            enable_tracking: None,
            queue_draft: None,
        }
    }

    /// Reads `content` to the end and attaches it base64-encoded under `name`.
    ///
    /// # Errors
    ///
    /// [`Error::AttachmentExists`] if `name` is already attached, [`Error::Io`] if
    /// reading fails. The existing attachments are untouched either way.
    pub fn attach(&mut self, name: impl Into<String>, mut content: impl Read) -> Result<()> {
        let name = name.into();
        if self.attachments.contains_key(&name) {
            return Err(Error::AttachmentExists(name));
        }

        let mut buf = Vec::new();
        content.read_to_end(&mut buf)?;
        self.attachments.insert(name, STANDARD.encode(buf));
        Ok(())
    }

    /// Attaches in-memory content under `name`.
    pub fn attach_bytes(&mut self, name: impl Into<String>, content: &[u8]) -> Result<()> {
        self.attach(name, content)
    }
}

/// A transactional push notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendPushRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactional_message_id: Option<String>,
    pub identifiers: Identifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_message_retention: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_to_unsubscribed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_draft: Option<bool>,
    /// Epoch seconds to deliver at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_payload: Option<Value>,
    /// Sent as `custom_device`, with the device id under `token`.
    #[serde(
        rename = "custom_device",
        serialize_with = "crate::device::serialize_as_token",
        skip_serializing_if = "Option::is_none"
    )]
    pub device: Option<Device>,
}

impl SendPushRequest {
    pub fn new(identifiers: Identifier) -> Self {
        Self {
            transactional_message_id: None,
            identifiers,
            message_data: None,
            to: None,
            disable_message_retention: None,
            send_to_unsubscribed: None,
            queue_draft: None,
            send_at: None,
            language: None,
            title: None,
            message: None,
            image_url: None,
            link: None,
            custom_data: None,
            custom_payload: None,
            device: None,
        }
    }
}

/// A transactional SMS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendSmsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactional_message_id: Option<String>,
    pub identifiers: Identifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_message_retention: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_to_unsubscribed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl SendSmsRequest {
    pub fn new(identifiers: Identifier) -> Self {
        Self {
            transactional_message_id: None,
            identifiers,
            message_data: None,
            disable_message_retention: None,
            send_to_unsubscribed: None,
            queue_draft: None,
            send_at: None,
            language: None,
            from: None,
            to: None,
        }
    }
}
