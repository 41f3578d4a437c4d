use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::ValidateEmail;

/// Errors that can occur while delivering a message
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email delivery is disabled: {0}")]
    Disabled(String),

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Message has neither a plain-text nor an HTML body")]
    EmptyBody,

    #[error("Outbox I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A fully rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub plain_body: Option<String>,
    pub html_body: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EmailMessage {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        plain_body: Option<String>,
        html_body: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            plain_body,
            html_body,
            created_at: Utc::now(),
        }
    }

    /// Checks shared by every transport
    fn check(&self) -> Result<(), MailError> {
        if !self.to.validate_email() {
            return Err(MailError::InvalidRecipient(self.to.clone()));
        }
        if self.plain_body.is_none() && self.html_body.is_none() {
            return Err(MailError::EmptyBody);
        }
        Ok(())
    }
}

/// Proof that a transport accepted a message
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub message_id: Uuid,
    pub transport: &'static str,
    pub location: Option<PathBuf>,
}

/// Delivery seam between digest tasks and the outside world
#[async_trait]
pub trait Mailer: Send + Sync {
    fn transport(&self) -> &'static str;

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError>;
}

/// Writes each message as a JSON file into a directory
///
/// An external relay (or a person) picks messages up from there.
#[derive(Debug, Clone)]
pub struct OutboxMailer {
    dir: PathBuf,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    fn transport(&self) -> &'static str {
        "outbox"
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError> {
        message.check()?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = format!(
            "{}-{}.json",
            message.created_at.format("%Y%m%dT%H%M%S"),
            message.id
        );
        let path = self.dir.join(file_name);
        let json = serde_json::to_vec_pretty(message)?;
        tokio::fs::write(&path, json).await?;

        tracing::info!("Queued email to {} in outbox: {}", message.to, message.subject);

        Ok(DeliveryReceipt {
            message_id: message.id,
            transport: self.transport(),
            location: Some(path),
        })
    }
}

/// Keeps messages in memory instead of delivering them
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    fn transport(&self) -> &'static str {
        "memory"
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError> {
        message.check()?;
        self.sent.lock().await.push(message.clone());
        tracing::info!("Mock email sent to {}: {}", message.to, message.subject);

        Ok(DeliveryReceipt {
            message_id: message.id,
            transport: self.transport(),
            location: None,
        })
    }
}

/// Refuses every message; used when email settings are incomplete
#[derive(Debug, Clone)]
pub struct DisabledMailer {
    reason: String,
}

impl DisabledMailer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Mailer for DisabledMailer {
    fn transport(&self) -> &'static str {
        "disabled"
    }

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError> {
        tracing::warn!("Dropping email to {}: delivery disabled", message.to);
        Err(MailError::Disabled(self.reason.clone()))
    }
}
