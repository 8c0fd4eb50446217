//! Storage platform client.
//!
//! All durable state lives in an external backend-as-a-service platform
//! (Appwrite-compatible REST API): user and file records in its document
//! database, login sessions in its auth service, file blobs in its storage
//! buckets. This module wraps that API.
//!
//! The identity flow depends on the [`Platform`] capability trait rather
//! than the concrete client, so tests can substitute a fake. The concrete
//! [`AppwriteClient`] implements the trait and additionally exposes the
//! file-record and blob operations used by the file service.

mod appwrite;
pub mod types;

pub use appwrite::AppwriteClient;

use async_trait::async_trait;
use thiserror::Error;

use stratus_core::{AccountId, Email};

use crate::models::{AccountIdentity, EstablishedSession, NewUserRecord, UserRecord};

/// Errors that can occur when talking to the storage platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl PlatformError {
    /// Whether the platform rejected the request (as opposed to failing).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status < 500)
    }
}

/// Capabilities the identity flow needs from the platform.
///
/// Every call is a single attempt against the remote service; no retries
/// and no timeout beyond the HTTP client defaults.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Find the user record whose `email` attribute equals the input.
    ///
    /// Returns the first match; zero matches is not an error.
    async fn find_user_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserRecord>, PlatformError>;

    /// Find the user record whose `accountId` attribute equals the input.
    async fn find_user_by_account_id(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<UserRecord>, PlatformError>;

    /// Create a new user record document.
    async fn create_user_record(&self, user: NewUserRecord) -> Result<UserRecord, PlatformError>;

    /// Ask the platform to email a one-time passcode.
    ///
    /// Returns the account identity the passcode was issued for.
    async fn create_email_token(&self, email: &Email) -> Result<AccountId, PlatformError>;

    /// Exchange an account id and emailed passcode for a session.
    async fn create_session(
        &self,
        account_id: &AccountId,
        secret: &str,
    ) -> Result<EstablishedSession, PlatformError>;

    /// Fetch the account behind a session secret.
    async fn get_account(&self, session_secret: &str) -> Result<AccountIdentity, PlatformError>;

    /// Delete the session the secret belongs to.
    async fn delete_current_session(&self, session_secret: &str) -> Result<(), PlatformError>;
}
