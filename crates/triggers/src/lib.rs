//! HTTP trigger service.
//!
//! The hosting event system POSTs storage change events here:
//! - `POST /triggers/couples/{couple_id}/notifications/{notification_id}` on notification creation
//! - `POST /triggers/couples/{couple_id}/tokens/{user_id}` on any token record write
pub mod routes;
pub mod state;
