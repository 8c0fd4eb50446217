//! File domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stratus_core::{AccountId, BucketFileId, DocumentId};

use crate::platform::PlatformError;
use crate::platform::types::FileDocument;

/// Broad category of an uploaded file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Document,
    Image,
    Video,
    Audio,
    Other,
}

impl FileKind {
    /// Classify a file by its extension (case-insensitive).
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" | "doc" | "docx" | "txt" | "xls" | "xlsx" | "csv" | "rtf" | "ods" | "ppt"
            | "pptx" | "md" | "html" | "htm" | "odp" => Self::Document,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "webp" => Self::Image,
            "mp4" | "avi" | "mov" | "mkv" | "webm" => Self::Video,
            "mp3" | "wav" | "ogg" | "flac" => Self::Audio,
            _ => Self::Other,
        }
    }

    /// The wire representation stored in file records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file record (domain type).
///
/// The record lives in the files collection; the blob it describes lives
/// in the platform bucket under `bucket_file_id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Document id of the record in the files collection.
    pub id: DocumentId,
    /// Display name, including extension.
    pub name: String,
    /// Broad file category.
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Direct view URL for the blob.
    pub url: String,
    /// File extension without the dot.
    pub extension: String,
    /// Blob size in bytes.
    pub size: u64,
    /// Document id of the owning user record.
    pub owner: DocumentId,
    /// Auth-service account of the owner.
    pub account_id: AccountId,
    /// Emails the file is shared with.
    pub users: Vec<String>,
    /// Blob id in the storage bucket.
    pub bucket_file_id: BucketFileId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a new file record.
///
/// Serializes with the platform's attribute names so it can be sent
/// directly as document data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFileRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub url: String,
    pub extension: String,
    pub size: u64,
    pub owner: DocumentId,
    pub account_id: AccountId,
    pub users: Vec<String>,
    pub bucket_file_id: BucketFileId,
}

impl TryFrom<FileDocument> for FileRecord {
    type Error = PlatformError;

    fn try_from(doc: FileDocument) -> Result<Self, Self::Error> {
        let kind = serde_json::from_value(serde_json::Value::String(doc.kind.clone()))
            .map_err(|_| {
                PlatformError::Parse(format!("file document {}: unknown type {}", doc.id, doc.kind))
            })?;

        Ok(Self {
            id: DocumentId::new(doc.id),
            name: doc.name,
            kind,
            url: doc.url,
            extension: doc.extension,
            size: doc.size,
            owner: DocumentId::new(doc.owner),
            account_id: AccountId::new(doc.account_id),
            users: doc.users,
            bucket_file_id: BucketFileId::new(doc.bucket_file_id),
            created_at: doc.created_at,
        })
    }
}

/// Split a file name into (stem, extension).
///
/// The extension is everything after the final dot; a name with no dot has
/// an empty extension.
#[must_use]
pub fn split_file_name(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (name, ""),
    }
}
