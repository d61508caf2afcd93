//! Document store abstraction for status write-back.
//!
//! The dispatcher only ever issues one partial update per record. Every
//! backend must reject updates to documents that do not exist and must assign
//! `ServerTimestamp` fields from its own clock at commit time.

pub mod firestore;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use fittogether_common::types::DeliveryStatus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Firestore request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Firestore rejected write ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// A value written to a single document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Bool(bool),
    String(String),
    /// Resolved by the store itself when the write commits.
    ServerTimestamp,
}

/// An ordered set of field assignments applied atomically to one document.
pub type FieldUpdate = Vec<(String, FieldValue)>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Merge `fields` into the existing document at `path`.
    async fn update_fields(&self, path: &str, fields: FieldUpdate) -> Result<(), StoreError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Status fields written back onto a notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Delivered { message_id: String },
    Failed { error: String },
}

impl StatusUpdate {
    pub fn status(&self) -> DeliveryStatus {
        match self {
            StatusUpdate::Delivered { .. } => DeliveryStatus::Delivered,
            StatusUpdate::Failed { .. } => DeliveryStatus::Failed,
        }
    }

    pub fn into_fields(self) -> FieldUpdate {
        let status = self.status().as_str().to_string();
        match self {
            StatusUpdate::Delivered { message_id } => vec![
                ("sent".to_string(), FieldValue::Bool(true)),
                ("sentAt".to_string(), FieldValue::ServerTimestamp),
                ("messageId".to_string(), FieldValue::String(message_id)),
                ("status".to_string(), FieldValue::String(status)),
            ],
            StatusUpdate::Failed { error } => vec![
                ("sent".to_string(), FieldValue::Bool(false)),
                ("error".to_string(), FieldValue::String(error)),
                ("errorAt".to_string(), FieldValue::ServerTimestamp),
                ("status".to_string(), FieldValue::String(status)),
            ],
        }
    }
}
