//! Notification creation trigger.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use fittogether_common::error::AppError;
use fittogether_common::types::NotificationRecord;
use fittogether_notifier::dispatcher::NotificationCreated;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/triggers/couples/{couple_id}/notifications/{notification_id}",
        post(notification_created),
    )
}

/// POST /triggers/couples/:couple_id/notifications/:notification_id
///
/// Body is the created record. Responds with the provider message id, or
/// `null` when the record had no destination token.
async fn notification_created(
    State(state): State<AppState>,
    Path((couple_id, notification_id)): Path<(String, String)>,
    Json(record): Json<NotificationRecord>,
) -> Result<Json<serde_json::Value>, AppError> {
    let invocation_id = Uuid::new_v4();
    let span = tracing::info_span!("send_notification", %invocation_id);

    let event = NotificationCreated {
        couple_id,
        notification_id,
        record,
    };

    let outcome = state.dispatcher.dispatch(&event).instrument(span).await?;
    Ok(Json(json!({ "result": outcome.message_id() })))
}
