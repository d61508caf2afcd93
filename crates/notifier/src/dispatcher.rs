//! Notification dispatcher.
//!
//! Reacts to a newly created notification record:
//! 1. Skips silently when the record has no destination token
//! 2. Builds the push message (see `message`); a badly typed record counts
//!    as a failed delivery without any call to the provider
//! 3. Makes exactly one delivery attempt
//! 4. Writes the outcome back onto the same record in a single update
//!
//! A delivery failure is recorded and then returned as the invocation's error.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use fittogether_common::error::AppError;
use fittogether_common::types::{NotificationRecord, notification_path};

use crate::message::{DeliveryHints, PushMessage};
use crate::push::{PushError, PushSender};
use crate::store::{DocumentStore, StatusUpdate, StoreError};

/// A creation event for `couples/{coupleId}/notifications/{notificationId}`.
#[derive(Debug, Clone)]
pub struct NotificationCreated {
    pub couple_id: String,
    pub notification_id: String,
    pub record: NotificationRecord,
}

/// Successful invocation outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No destination token; nothing was sent or written.
    Skipped,
    Delivered { message_id: String },
}

impl DispatchOutcome {
    pub fn message_id(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Skipped => None,
            DispatchOutcome::Delivered { message_id } => Some(message_id),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Delivery failed; the failure is already recorded on the notification.
    #[error(transparent)]
    Delivery(#[from] PushError),

    /// The status write-back itself failed.
    #[error(transparent)]
    WriteBack(#[from] StoreError),
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Delivery(e) => AppError::Delivery(e.to_string()),
            DispatchError::WriteBack(e) => AppError::Storage(e.to_string()),
        }
    }
}

pub struct NotificationDispatcher {
    store: Arc<dyn DocumentStore>,
    push: Arc<dyn PushSender>,
    hints: DeliveryHints,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn DocumentStore>, push: Arc<dyn PushSender>) -> Self {
        Self {
            store,
            push,
            hints: DeliveryHints::default(),
        }
    }

    pub async fn dispatch(
        &self,
        event: &NotificationCreated,
    ) -> Result<DispatchOutcome, DispatchError> {
        tracing::info!(
            couple_id = %event.couple_id,
            notification_id = %event.notification_id,
            "Notification trigger received"
        );

        let path = notification_path(&event.couple_id, &event.notification_id);

        let delivery = match PushMessage::build(
            &event.record,
            &event.couple_id,
            &event.notification_id,
            &self.hints,
            Utc::now(),
        ) {
            Ok(None) => {
                tracing::warn!(
                    couple_id = %event.couple_id,
                    notification_id = %event.notification_id,
                    "No push token on notification record, skipping"
                );
                return Ok(DispatchOutcome::Skipped);
            }
            Ok(Some(message)) => {
                tracing::debug!(
                    notification_id = %event.notification_id,
                    notification_type = %message.data.get("type").map(String::as_str).unwrap_or_default(),
                    "Sending push message"
                );
                self.push.send(&message).await
            }
            Err(invalid) => Err(PushError::from(invalid)),
        };

        match delivery {
            Ok(message_id) => {
                tracing::info!(
                    notification_id = %event.notification_id,
                    message_id = %message_id,
                    "Notification sent"
                );

                self.store
                    .update_fields(
                        &path,
                        StatusUpdate::Delivered {
                            message_id: message_id.clone(),
                        }
                        .into_fields(),
                    )
                    .await?;

                Ok(DispatchOutcome::Delivered { message_id })
            }
            Err(err) => {
                tracing::error!(
                    notification_id = %event.notification_id,
                    error = %err,
                    "Push delivery failed"
                );

                self.store
                    .update_fields(
                        &path,
                        StatusUpdate::Failed {
                            error: err.to_string(),
                        }
                        .into_fields(),
                    )
                    .await?;

                Err(DispatchError::Delivery(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use crate::store::memory::MemoryStore;

    /// Records every message; either always succeeds or always fails with one message.
    struct ScriptedPush {
        sent: Mutex<Vec<PushMessage>>,
        fail_with: Option<String>,
    }

    impl ScriptedPush {
        fn ok() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
            }
        }

        fn sent(&self) -> Vec<PushMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushSender for ScriptedPush {
        async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(message.clone());
            match &self.fail_with {
                Some(msg) => Err(PushError::Rejected {
                    status: StatusCode::NOT_FOUND,
                    code: Some("NOT_FOUND".to_string()),
                    message: msg.clone(),
                }),
                None => Ok(format!("projects/p/messages/{}", sent.len())),
            }
        }
    }

    fn event(record: serde_json::Value) -> NotificationCreated {
        NotificationCreated {
            couple_id: "couple-1".to_string(),
            notification_id: "notif-1".to_string(),
            record: serde_json::from_value(record).unwrap(),
        }
    }

    async fn seeded_store(record: &serde_json::Value) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(notification_path("couple-1", "notif-1"), record.clone())
            .await;
        store
    }

    #[tokio::test]
    async fn test_missing_token_is_silent_noop() {
        let record = serde_json::json!({ "notification": { "title": "Hi" } });
        let store = seeded_store(&record).await;
        let push = Arc::new(ScriptedPush::ok());
        let dispatcher = NotificationDispatcher::new(store.clone(), push.clone());

        let outcome = dispatcher.dispatch(&event(record)).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert!(push.sent().is_empty());
        let doc = store.get("couples/couple-1/notifications/notif-1").await.unwrap();
        assert!(doc.get("sent").is_none());
        assert!(doc.get("status").is_none());
    }

    #[tokio::test]
    async fn test_success_records_delivery() {
        let record = serde_json::json!({
            "to": "device-abc",
            "data": { "coupleId": "other", "type": "workout" }
        });
        let store = seeded_store(&record).await;
        let push = Arc::new(ScriptedPush::ok());
        let dispatcher = NotificationDispatcher::new(store.clone(), push.clone());

        let outcome = dispatcher.dispatch(&event(record)).await.unwrap();

        assert_eq!(outcome.message_id(), Some("projects/p/messages/1"));
        let sent = push.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].token, "device-abc");
        assert_eq!(sent[0].data["coupleId"], "couple-1");
        assert_eq!(sent[0].data["notificationId"], "notif-1");
        assert_eq!(sent[0].data["type"], "workout");

        let doc = store.get("couples/couple-1/notifications/notif-1").await.unwrap();
        assert_eq!(doc["sent"], true);
        assert_eq!(doc["status"], "delivered");
        assert_eq!(doc["messageId"], "projects/p/messages/1");
        assert!(doc.get("sentAt").is_some());
        assert!(doc.get("error").is_none());
    }

    #[tokio::test]
    async fn test_failure_records_and_propagates_error() {
        let record = serde_json::json!({ "to": "stale-token" });
        let store = seeded_store(&record).await;
        let push = Arc::new(ScriptedPush::failing("Requested entity was not found."));
        let dispatcher = NotificationDispatcher::new(store.clone(), push.clone());

        let err = dispatcher.dispatch(&event(record)).await.unwrap_err();

        assert!(matches!(err, DispatchError::Delivery(_)));
        assert_eq!(err.to_string(), "Requested entity was not found.");
        assert_eq!(push.sent().len(), 1);

        let doc = store.get("couples/couple-1/notifications/notif-1").await.unwrap();
        assert_eq!(doc["sent"], false);
        assert_eq!(doc["status"], "failed");
        assert_eq!(doc["error"], "Requested entity was not found.");
        assert!(doc.get("errorAt").is_some());
        assert!(doc.get("messageId").is_none());
    }

    #[tokio::test]
    async fn test_invalid_record_is_recorded_as_failure() {
        let record = serde_json::json!({
            "to": "device-abc",
            "data": { "type": "workout", "reps": 12 }
        });
        let store = seeded_store(&record).await;
        let push = Arc::new(ScriptedPush::ok());
        let dispatcher = NotificationDispatcher::new(store.clone(), push.clone());

        let err = dispatcher.dispatch(&event(record)).await.unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Delivery(PushError::InvalidMessage(_))
        ));
        assert!(push.sent().is_empty());

        let doc = store.get("couples/couple-1/notifications/notif-1").await.unwrap();
        assert_eq!(doc["sent"], false);
        assert_eq!(doc["status"], "failed");
        assert_eq!(doc["error"], err.to_string());
        assert!(doc["error"].as_str().unwrap().contains("data.reps"));
        assert!(doc.get("errorAt").is_some());
    }

    #[tokio::test]
    async fn test_write_back_failure_propagates() {
        // Record was never stored, so the update has nothing to patch.
        let store = Arc::new(MemoryStore::new());
        let push = Arc::new(ScriptedPush::ok());
        let dispatcher = NotificationDispatcher::new(store, push.clone());

        let err = dispatcher
            .dispatch(&event(serde_json::json!({ "to": "tok" })))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::WriteBack(StoreError::NotFound(_))));
        assert_eq!(push.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_redelivery_sends_again_and_overwrites_status() {
        let record = serde_json::json!({ "to": "device-abc" });
        let store = seeded_store(&record).await;
        let push = Arc::new(ScriptedPush::ok());
        let dispatcher = NotificationDispatcher::new(store.clone(), push.clone());
        let ev = event(record);

        dispatcher.dispatch(&ev).await.unwrap();
        let second = dispatcher.dispatch(&ev).await.unwrap();

        assert_eq!(push.sent().len(), 2);
        assert_eq!(second.message_id(), Some("projects/p/messages/2"));
        let doc = store.get("couples/couple-1/notifications/notif-1").await.unwrap();
        assert_eq!(doc["messageId"], "projects/p/messages/2");
    }
}
