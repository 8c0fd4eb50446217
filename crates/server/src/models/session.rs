//! Session-related types.

use secrecy::SecretString;
use serde::Serialize;

use stratus_core::{AccountId, SessionId};

/// A session established by a verified OTP.
///
/// The secret is handed to the session cookie adapter and never serialized.
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    /// Platform identifier of the session.
    pub session_id: SessionId,
    /// Opaque session secret, stored only in the session cookie.
    pub secret: SecretString,
}

/// Outcome of a sign-in attempt for an existing user.
///
/// Unlike the other gateway operations, an unknown email is reported as
/// data rather than as an error, so the caller can render it inline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInOutcome {
    /// Account to verify the emailed passcode against, when the user exists.
    pub account_id: Option<AccountId>,
    /// Human-readable reason when no account id is returned.
    pub error: Option<String>,
}

impl SignInOutcome {
    /// Outcome for a known user: OTP sent, account id returned.
    #[must_use]
    pub const fn sent(account_id: AccountId) -> Self {
        Self {
            account_id: Some(account_id),
            error: None,
        }
    }

    /// Outcome for an unknown email.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            account_id: None,
            error: Some("user not found".to_string()),
        }
    }
}
