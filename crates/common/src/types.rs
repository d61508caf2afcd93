use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Root collection every record lives under.
pub const COUPLES_COLLECTION: &str = "couples";

/// Fallback title when the record carries none.
pub const DEFAULT_TITLE: &str = "FitTogether";

/// Fallback body when the record carries none.
pub const DEFAULT_BODY: &str = "New entry added";

/// Fallback classification tag for `data.type`.
pub const DEFAULT_NOTIFICATION_TYPE: &str = "general";

/// Outcome recorded on a notification record after the push attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a notification record cannot be turned into a push message.
///
/// The text mirrors the push provider's own validation messages, since it is
/// written to the record's `error` field like any other delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRecord {
    #[error("Message.token must be a non-empty string")]
    Token,

    #[error("Message.notification must be an object")]
    Notification,

    #[error("Message.notification.{0} must be a string")]
    NotificationField(&'static str),

    #[error("Message.data must be an object")]
    Data,

    #[error("Messaging payload contains an invalid value for the \"data.{0}\" property. Values must be strings.")]
    DataValue(String),
}

/// A notification record as written by the app at
/// `couples/{coupleId}/notifications/{notificationId}`.
///
/// Fields are kept as raw JSON so that a record with badly typed values still
/// reaches the dispatcher and is marked failed, rather than being rejected on
/// arrival. Status fields written back after delivery are ignored on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Destination device token
    #[serde(default)]
    pub to: Option<Value>,

    /// `{ "title": ..., "body": ... }`
    #[serde(default)]
    pub notification: Option<Value>,

    /// Forwarded verbatim to the device; values must be strings
    #[serde(default)]
    pub data: Option<Value>,
}

impl NotificationRecord {
    /// The destination token. Absent, `null` and `""` mean "no destination".
    pub fn destination(&self) -> Result<Option<&str>, InvalidRecord> {
        match &self.to {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(token)) => Ok(non_empty(Some(token.as_str()))),
            Some(_) => Err(InvalidRecord::Token),
        }
    }

    pub fn title(&self) -> Result<&str, InvalidRecord> {
        self.display_field("title", DEFAULT_TITLE)
    }

    pub fn body(&self) -> Result<&str, InvalidRecord> {
        self.display_field("body", DEFAULT_BODY)
    }

    /// The `data` map with every value checked to be a string.
    pub fn data(&self) -> Result<BTreeMap<String, String>, InvalidRecord> {
        let entries = match &self.data {
            None | Some(Value::Null) => return Ok(BTreeMap::new()),
            Some(Value::Object(entries)) => entries,
            Some(_) => return Err(InvalidRecord::Data),
        };

        entries
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => Ok((key.clone(), s.clone())),
                _ => Err(InvalidRecord::DataValue(key.clone())),
            })
            .collect()
    }

    pub fn notification_type(&self) -> &str {
        non_empty(
            self.data
                .as_ref()
                .and_then(|d| d.get("type"))
                .and_then(Value::as_str),
        )
        .unwrap_or(DEFAULT_NOTIFICATION_TYPE)
    }

    fn display_field(
        &self,
        field: &'static str,
        fallback: &'static str,
    ) -> Result<&str, InvalidRecord> {
        let value = match &self.notification {
            None | Some(Value::Null) => None,
            Some(Value::Object(content)) => content.get(field),
            Some(_) => return Err(InvalidRecord::Notification),
        };

        match value {
            None | Some(Value::Null) => Ok(fallback),
            Some(Value::String(s)) => Ok(non_empty(Some(s.as_str())).unwrap_or(fallback)),
            Some(_) => Err(InvalidRecord::NotificationField(field)),
        }
    }
}

/// A user's push token record at `couples/{coupleId}/tokens/{userId}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(default)]
    pub token: Option<String>,
}

impl TokenRecord {
    pub fn token(&self) -> Option<&str> {
        non_empty(self.token.as_deref())
    }
}

/// Document path of a notification record.
pub fn notification_path(couple_id: &str, notification_id: &str) -> String {
    format!("{COUPLES_COLLECTION}/{couple_id}/notifications/{notification_id}")
}

/// Document path of a token record.
pub fn token_path(couple_id: &str, user_id: &str) -> String {
    format!("{COUPLES_COLLECTION}/{couple_id}/tokens/{user_id}")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
