//! Wire types for the storage platform REST API.
//!
//! The platform returns JSON documents whose system fields are prefixed
//! with `$` (`$id`, `$createdAt`). These types mirror the wire format;
//! conversions into domain models live next to the model types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A page of documents returned by a collection query.
#[derive(Debug, Deserialize)]
pub struct DocumentList<T> {
    /// Total number of matching documents.
    pub total: u64,
    /// The documents on this page.
    pub documents: Vec<T>,
}

/// A user record document as stored in the users collection.
#[derive(Debug, Clone, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    pub avatar: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
}

/// A file record document as stored in the files collection.
#[derive(Debug, Clone, Deserialize)]
pub struct FileDocument {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub extension: String,
    pub size: u64,
    /// Document id of the owning user record.
    pub owner: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
    /// Emails the file is shared with.
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(rename = "bucketFileId")]
    pub bucket_file_id: String,
}

/// An email token issued when an OTP is requested.
///
/// The passcode itself is emailed to the user; the response only carries
/// the account identifier correlating the challenge.
#[derive(Debug, Deserialize)]
pub struct Token {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Empty when the secret is delivered out of band (emailed).
    #[serde(default)]
    pub secret: String,
}

/// A session created from a verified OTP.
#[derive(Debug, Deserialize)]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Opaque session secret, present on server-side session creation.
    #[serde(default)]
    pub secret: String,
}

/// The account behind an active session.
#[derive(Debug, Deserialize)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// A file blob stored in a bucket.
#[derive(Debug, Deserialize)]
pub struct StorageFile {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "sizeOriginal")]
    pub size_original: u64,
}
