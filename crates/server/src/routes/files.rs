//! File route handlers.
//!
//! All file routes require an authenticated user; unauthenticated
//! requests are redirected to the sign-in entry point by the extractor.

use axum::{
    extract::{Json, Multipart, Path, State},
    http::StatusCode,
    response::Redirect,
};
use serde::Deserialize;

use stratus_core::DocumentId;

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::FileRecord;
use crate::state::AppState;

/// Fallback name for uploads whose part carries no file name.
const DEFAULT_UPLOAD_NAME: &str = "upload";

/// Fallback MIME type for uploads whose part carries none.
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Rename request body.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// New name, without extension.
    pub name: String,
}

/// Share-list update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateUsersRequest {
    /// Emails the file is shared with; replaces the previous list.
    pub emails: Vec<String>,
}

/// List files owned by or shared with the current user.
///
/// # Route
///
/// `GET /files`
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<FileRecord>>> {
    let files = state.files().list_for(&user).await?;
    Ok(Json(files))
}

/// Upload a file from a multipart form.
///
/// Expects a single `file` part; its file name and content type are
/// carried over to the stored record.
///
/// # Route
///
/// `POST /files`
pub async fn upload(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    mut multipart: Multipart,
) -> Result<Json<FileRecord>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();
        let mime_type = field
            .content_type()
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
            .to_vec();

        let record = state
            .files()
            .upload(&user, &file_name, &mime_type, bytes)
            .await?;
        return Ok(Json(record));
    }

    Err(AppError::BadRequest("missing 'file' field".to_string()))
}

/// Rename a file, preserving its extension.
///
/// # Route
///
/// `PATCH /files/{id}/rename`
pub async fn rename(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> Result<Json<FileRecord>> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("file name cannot be empty".to_string()));
    }

    let record = state
        .files()
        .rename(&user, &DocumentId::new(id), name)
        .await?;
    Ok(Json(record))
}

/// Replace the list of emails a file is shared with.
///
/// # Route
///
/// `PATCH /files/{id}/users`
pub async fn update_users(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateUsersRequest>,
) -> Result<Json<FileRecord>> {
    let record = state
        .files()
        .update_users(&user, &DocumentId::new(id), request.emails)
        .await?;
    Ok(Json(record))
}

/// Delete a file record and its blob.
///
/// # Route
///
/// `DELETE /files/{id}`
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.files().delete(&user, &DocumentId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Redirect to the platform download URL for a file.
///
/// # Route
///
/// `GET /files/{id}/download`
pub async fn download(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let url = state
        .files()
        .download_url(&user, &DocumentId::new(id))
        .await?;
    Ok(Redirect::to(&url))
}
