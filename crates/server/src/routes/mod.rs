//! HTTP route handlers for the server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (pings the platform)
//! GET  /sign-in                - Sign-in entry point (redirect target)
//!
//! # Auth
//! POST /auth/sign-up           - Create account, email an OTP
//! POST /auth/sign-in           - Email a fresh OTP to an existing user
//! POST /auth/verify-otp        - Verify passcode, establish session cookie
//! POST /auth/sign-out          - Delete session, clear cookie, redirect
//! GET  /auth/me                - Current user
//!
//! # Files (requires auth)
//! GET    /files                - List owned and shared files
//! POST   /files                - Upload (multipart, `file` field)
//! PATCH  /files/{id}/rename    - Rename, preserving extension
//! PATCH  /files/{id}/users     - Replace the share list
//! DELETE /files/{id}           - Delete record and blob
//! GET    /files/{id}/download  - Redirect to the platform download URL
//! ```

pub mod auth;
pub mod files;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

/// Maximum accepted upload size (50 MB).
const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/sign-out", post(auth::sign_out))
        .route("/me", get(auth::me))
}

/// Create the file routes router.
pub fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(files::list).post(files::upload))
        .route("/{id}/rename", patch(files::rename))
        .route("/{id}/users", patch(files::update_users))
        .route("/{id}", delete(files::delete))
        .route("/{id}/download", get(files::download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", get(sign_in_entry))
        .nest("/auth", auth_routes())
        .nest("/files", file_routes())
}

/// Sign-in entry point.
///
/// Unauthenticated requests and completed sign-outs land here; the web
/// client renders the actual form.
async fn sign_in_entry() -> &'static str {
    "Sign in with your email to continue."
}
