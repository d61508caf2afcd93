//! Token record write trigger.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use fittogether_common::types::{TokenRecord, token_path};
use fittogether_notifier::token_observer::TokenWritten;

use crate::state::AppState;

/// Before/after snapshots of the written record; `null` when it did not exist.
#[derive(Debug, Deserialize)]
pub struct TokenChangeBody {
    #[serde(default)]
    pub before: Option<TokenRecord>,
    #[serde(default)]
    pub after: Option<TokenRecord>,
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/triggers/couples/{couple_id}/tokens/{user_id}",
        post(token_written),
    )
}

/// POST /triggers/couples/:couple_id/tokens/:user_id — always `{"result": null}`.
async fn token_written(
    State(state): State<AppState>,
    Path((couple_id, user_id)): Path<(String, String)>,
    Json(body): Json<TokenChangeBody>,
) -> Json<serde_json::Value> {
    let invocation_id = Uuid::new_v4();
    let path = token_path(&couple_id, &user_id);
    let event = TokenWritten {
        couple_id,
        user_id,
        before: body.before,
        after: body.after,
    };

    tracing::info_span!("update_token", %invocation_id, %path)
        .in_scope(|| state.observer.observe(&event));

    Json(json!({ "result": null }))
}
