//! File service.
//!
//! Thin orchestration over the platform's document database and blob
//! storage: a file is one record in the files collection plus one blob in
//! the bucket, created together and removed together.

use thiserror::Error;

use stratus_core::{BucketFileId, DocumentId, Email};

use crate::models::file::split_file_name;
use crate::models::{FileKind, FileRecord, NewFileRecord, UserRecord};
use crate::platform::{AppwriteClient, PlatformError};

/// Errors that can occur during file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// No file record with the given id.
    #[error("file not found")]
    NotFound,

    /// The requester does not own the file.
    #[error("not the file owner")]
    Forbidden,

    /// A share target is not a valid email address.
    #[error("invalid share email: {0}")]
    InvalidShareEmail(String),

    /// The platform call failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Service for uploading, listing, sharing, and deleting files.
pub struct FileService {
    platform: AppwriteClient,
}

impl FileService {
    /// Create a new file service.
    #[must_use]
    pub const fn new(platform: AppwriteClient) -> Self {
        Self { platform }
    }

    /// Upload a file: store the blob, then create its record.
    ///
    /// If record creation fails the blob is deleted best-effort before the
    /// error propagates, so no orphaned blob is left behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload or record creation fails.
    pub async fn upload(
        &self,
        owner: &UserRecord,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<FileRecord, FileError> {
        let blob = self
            .platform
            .upload_blob(file_name, mime_type, bytes)
            .await?;
        let blob_id = BucketFileId::new(blob.id);

        let (_, extension) = split_file_name(file_name);
        let record = NewFileRecord {
            name: file_name.to_owned(),
            kind: FileKind::from_extension(extension),
            url: self.platform.blob_view_url(&blob_id),
            extension: extension.to_owned(),
            size: blob.size_original,
            owner: owner.id.clone(),
            account_id: owner.account_id.clone(),
            users: Vec::new(),
            bucket_file_id: blob_id.clone(),
        };

        match self.platform.create_file_record(record).await {
            Ok(doc) => Ok(FileRecord::try_from(doc)?),
            Err(e) => {
                if let Err(cleanup) = self.platform.delete_blob(&blob_id).await {
                    tracing::warn!(error = %cleanup, "failed to delete orphaned blob");
                }
                tracing::error!(error = %e, "failed to create file record");
                Err(e.into())
            }
        }
    }

    /// List files owned by or shared with a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform query fails.
    pub async fn list_for(&self, user: &UserRecord) -> Result<Vec<FileRecord>, FileError> {
        let docs = self
            .platform
            .list_file_records(&user.id, &user.email)
            .await?;

        docs.into_iter()
            .map(|doc| FileRecord::try_from(doc).map_err(FileError::from))
            .collect()
    }

    /// Rename a file, preserving its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, not owned by the
    /// requester, or the update fails.
    pub async fn rename(
        &self,
        user: &UserRecord,
        file_id: &DocumentId,
        new_name: &str,
    ) -> Result<FileRecord, FileError> {
        let record = self.owned_record(user, file_id).await?;

        let name = if record.extension.is_empty() {
            new_name.to_owned()
        } else {
            format!("{new_name}.{}", record.extension)
        };

        let doc = self
            .platform
            .update_file_record(file_id, &serde_json::json!({ "name": name }))
            .await?;
        Ok(FileRecord::try_from(doc)?)
    }

    /// Replace the list of emails a file is shared with.
    ///
    /// # Errors
    ///
    /// Returns an error if any share target is not a valid email, the file
    /// is missing or not owned by the requester, or the update fails.
    pub async fn update_users(
        &self,
        user: &UserRecord,
        file_id: &DocumentId,
        emails: Vec<String>,
    ) -> Result<FileRecord, FileError> {
        for email in &emails {
            Email::parse(email).map_err(|_| FileError::InvalidShareEmail(email.clone()))?;
        }

        self.owned_record(user, file_id).await?;

        let doc = self
            .platform
            .update_file_record(file_id, &serde_json::json!({ "users": emails }))
            .await?;
        Ok(FileRecord::try_from(doc)?)
    }

    /// Delete a file record, then its blob best-effort.
    ///
    /// A blob whose record is already gone is logged, not surfaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, not owned by the
    /// requester, or the record deletion fails.
    pub async fn delete(&self, user: &UserRecord, file_id: &DocumentId) -> Result<(), FileError> {
        let record = self.owned_record(user, file_id).await?;

        self.platform.delete_file_record(file_id).await?;

        if let Err(e) = self.platform.delete_blob(&record.bucket_file_id).await {
            tracing::warn!(error = %e, "failed to delete blob for removed file record");
        }

        Ok(())
    }

    /// Download URL for a file the user owns or has been shared.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or the user has no access.
    pub async fn download_url(
        &self,
        user: &UserRecord,
        file_id: &DocumentId,
    ) -> Result<String, FileError> {
        let record = self.accessible_record(user, file_id).await?;
        Ok(self.platform.blob_download_url(&record.bucket_file_id))
    }

    /// Fetch a record the user owns; mutations require ownership.
    async fn owned_record(
        &self,
        user: &UserRecord,
        file_id: &DocumentId,
    ) -> Result<FileRecord, FileError> {
        let record = self.fetch_record(file_id).await?;
        if record.owner != user.id {
            return Err(FileError::Forbidden);
        }
        Ok(record)
    }

    /// Fetch a record the user owns or appears in the share list of.
    async fn accessible_record(
        &self,
        user: &UserRecord,
        file_id: &DocumentId,
    ) -> Result<FileRecord, FileError> {
        let record = self.fetch_record(file_id).await?;
        let shared = record.users.iter().any(|e| e == user.email.as_str());
        if record.owner != user.id && !shared {
            return Err(FileError::Forbidden);
        }
        Ok(record)
    }

    async fn fetch_record(&self, file_id: &DocumentId) -> Result<FileRecord, FileError> {
        let doc = self
            .platform
            .get_file_record(file_id)
            .await?
            .ok_or(FileError::NotFound)?;
        Ok(FileRecord::try_from(doc)?)
    }
}
