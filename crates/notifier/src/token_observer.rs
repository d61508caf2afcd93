//! Token registration observer.
//!
//! Watches writes to `couples/{coupleId}/tokens/{userId}` and logs them. It
//! never writes data or calls out; tokens are redacted to a short prefix.

use fittogether_common::types::TokenRecord;

/// Number of leading token characters allowed into logs.
const TOKEN_LOG_PREFIX_CHARS: usize = 20;

/// A write event with before/after snapshots; `None` means the record did not exist.
#[derive(Debug, Clone)]
pub struct TokenWritten {
    pub couple_id: String,
    pub user_id: String,
    pub before: Option<TokenRecord>,
    pub after: Option<TokenRecord>,
}

/// How the user's push token changed in one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenChange {
    /// A token appears where there was none.
    Registered,
    Rotated,
    Unchanged,
    /// Record still exists but no longer carries a token.
    Cleared,
    Removed,
}

impl TokenWritten {
    pub fn change(&self) -> TokenChange {
        let before = self.before.as_ref().and_then(TokenRecord::token);
        match &self.after {
            None => TokenChange::Removed,
            Some(after) => match (before, after.token()) {
                (_, None) => TokenChange::Cleared,
                (None, Some(_)) => TokenChange::Registered,
                (Some(old), Some(new)) if old == new => TokenChange::Unchanged,
                (Some(_), Some(_)) => TokenChange::Rotated,
            },
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokenRegistrationObserver;

impl TokenRegistrationObserver {
    pub fn new() -> Self {
        Self
    }

    pub fn observe(&self, event: &TokenWritten) {
        let change = event.change();

        tracing::info!(
            couple_id = %event.couple_id,
            user_id = %event.user_id,
            change = ?change,
            "Token record written"
        );

        match event.after.as_ref().and_then(TokenRecord::token) {
            Some(token) => {
                tracing::info!(
                    user_id = %event.user_id,
                    token_prefix = %redact_token(token),
                    "New token registered"
                );
            }
            None if change == TokenChange::Removed => {
                tracing::info!(user_id = %event.user_id, "Token record removed");
            }
            None => {}
        }
    }
}

/// First characters of a token followed by `...`; the remainder never leaves this function.
pub fn redact_token(token: &str) -> String {
    let prefix: String = token.chars().take(TOKEN_LOG_PREFIX_CHARS).collect();
    format!("{prefix}...")
}
