//! Push notification dispatch for FitTogether couples.
//!
//! - `dispatcher` sends a push for each created notification record and writes
//!   the delivery status back onto it
//! - `token_observer` logs push token registrations
//! - `push` delivers messages through FCM
//! - `store` abstracts the document store the status is written to

pub mod dispatcher;
pub mod message;
pub mod push;
pub mod store;
pub mod token_observer;
