//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stratus_core::{AccountId, DocumentId, Email};

use crate::platform::PlatformError;
use crate::platform::types::{Account, UserDocument};

/// A user record (domain type).
///
/// Exists once per distinct email; created by the first completed
/// account-creation flow. The `account_id` ties the record to the
/// platform's auth service and never changes once set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Document id of the record in the users collection.
    pub id: DocumentId,
    /// User's display name.
    pub full_name: String,
    /// User's email address (lookup key).
    pub email: Email,
    /// Avatar URL (placeholder until the user uploads one).
    pub avatar: String,
    /// Auth-service account identity behind this record.
    pub account_id: AccountId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a new user record.
///
/// Serializes with the platform's attribute names so it can be sent
/// directly as document data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRecord {
    pub full_name: String,
    pub email: Email,
    pub avatar: String,
    pub account_id: AccountId,
}

/// The account identity behind an active session.
#[derive(Debug, Clone)]
pub struct AccountIdentity {
    /// Opaque account identifier issued by the auth service.
    pub id: AccountId,
    /// Email registered with the auth service, if any.
    pub email: Option<Email>,
}

impl TryFrom<UserDocument> for UserRecord {
    type Error = PlatformError;

    fn try_from(doc: UserDocument) -> Result<Self, Self::Error> {
        let email = Email::parse(&doc.email)
            .map_err(|e| PlatformError::Parse(format!("user document {}: {e}", doc.id)))?;

        Ok(Self {
            id: DocumentId::new(doc.id),
            full_name: doc.full_name,
            email,
            avatar: doc.avatar,
            account_id: AccountId::new(doc.account_id),
            created_at: doc.created_at,
        })
    }
}

impl From<Account> for AccountIdentity {
    fn from(account: Account) -> Self {
        Self {
            id: AccountId::new(account.id),
            email: Email::parse(&account.email).ok(),
        }
    }
}
