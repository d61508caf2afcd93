//! Outbound push message construction.
//!
//! Builds the FCM HTTP v1 `message` object from a freshly created notification
//! record. Construction is pure: the send time is passed in by the caller.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use fittogether_common::types::{InvalidRecord, NotificationRecord};

/// Payload keys the dispatcher always sets, overriding anything in `data`.
pub const KEY_NOTIFICATION_ID: &str = "notificationId";
pub const KEY_COUPLE_ID: &str = "coupleId";
pub const KEY_TYPE: &str = "type";
pub const KEY_TIMESTAMP: &str = "timestamp";

/// Platform presentation hints attached to every outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryHints {
    pub android_priority: &'static str,
    pub android_sound: &'static str,
    pub android_click_action: &'static str,
    pub android_channel_id: &'static str,
    pub apns_sound: &'static str,
    pub apns_badge: u32,
}

impl Default for DeliveryHints {
    fn default() -> Self {
        Self {
            android_priority: "high",
            android_sound: "default",
            android_click_action: "FLUTTER_NOTIFICATION_CLICK",
            android_channel_id: "high_importance_channel",
            apns_sound: "default",
            apns_badge: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidNotification {
    pub sound: String,
    pub click_action: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidConfig {
    pub priority: String,
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aps {
    pub sound: String,
    pub badge: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

/// A single-device push message in FCM HTTP v1 shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub token: String,
    pub notification: Notification,
    pub data: BTreeMap<String, String>,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

impl PushMessage {
    /// Build the outbound message for a created notification record.
    ///
    /// Returns `Ok(None)` when the record has no destination token, checked
    /// before anything else. Badly typed fields are an `InvalidRecord`.
    pub fn build(
        record: &NotificationRecord,
        couple_id: &str,
        notification_id: &str,
        hints: &DeliveryHints,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<Self>, InvalidRecord> {
        let Some(token) = record.destination()? else {
            return Ok(None);
        };

        let mut data = record.data()?;
        let notification_type = record.notification_type().to_string();
        data.insert(KEY_NOTIFICATION_ID.to_string(), notification_id.to_string());
        data.insert(KEY_COUPLE_ID.to_string(), couple_id.to_string());
        data.insert(KEY_TYPE.to_string(), notification_type);
        data.insert(
            KEY_TIMESTAMP.to_string(),
            sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        );

        Ok(Some(Self {
            token: token.to_string(),
            notification: Notification {
                title: record.title()?.to_string(),
                body: record.body()?.to_string(),
            },
            data,
            android: AndroidConfig {
                priority: hints.android_priority.to_string(),
                notification: AndroidNotification {
                    sound: hints.android_sound.to_string(),
                    click_action: hints.android_click_action.to_string(),
                    channel_id: hints.android_channel_id.to_string(),
                },
            },
            apns: ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps {
                        sound: hints.apns_sound.to_string(),
                        badge: hints.apns_badge,
                    },
                },
            },
        }))
    }
}
