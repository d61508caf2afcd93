pub mod health;
pub mod notifications;
pub mod tokens;

use axum::Router;

use crate::state::AppState;

/// Build the complete trigger router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(notifications::router())
        .merge(tokens::router())
        .with_state(state)
}
