//! Authentication route handlers.
//!
//! Exposes the OTP email sign-in flow: sign-up, sign-in, passcode
//! verification, sign-out, and current-user lookup.

use axum::{
    extract::{Json, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use stratus_core::{AccountId, Email, SessionId};

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    OptionalUser, SIGN_IN_PATH, clear_session_cookie, session_secret, set_session_cookie,
};
use crate::models::{SignInOutcome, UserRecord};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Sign-up request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub full_name: String,
    pub email: String,
}

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
}

/// OTP verification request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub account_id: String,
    pub passcode: String,
}

/// Response carrying the account id an OTP was issued for.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub account_id: AccountId,
}

/// Response carrying the id of an established session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: SessionId,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account and email an OTP.
///
/// # Route
///
/// `POST /auth/sign-up`
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<Json<AccountResponse>> {
    let full_name = request.full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::BadRequest("full name cannot be empty".to_string()));
    }
    let email = Email::parse(request.email.trim())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    add_breadcrumb(
        "auth",
        "Sign-up requested",
        Some(&[("email_domain", email.domain())]),
    );

    let account_id = state.identity().create_account(full_name, &email).await?;

    Ok(Json(AccountResponse { account_id }))
}

/// Sign in an existing user by emailing a fresh OTP.
///
/// An unknown email is reported in the outcome body, not as an error
/// status.
///
/// # Route
///
/// `POST /auth/sign-in`
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInOutcome>> {
    let email = Email::parse(request.email.trim())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    add_breadcrumb(
        "auth",
        "Sign-in requested",
        Some(&[("email_domain", email.domain())]),
    );

    let outcome = state.identity().sign_in_user(&email).await?;

    Ok(Json(outcome))
}

/// Verify the emailed passcode and establish a session.
///
/// On success the session secret is persisted in the session cookie; on
/// failure no cookie is written.
///
/// # Route
///
/// `POST /auth/verify-otp`
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Response> {
    let account_id = AccountId::new(request.account_id);

    let session = state
        .identity()
        .verify_otp(&account_id, &request.passcode)
        .await?;

    let cookie = set_session_cookie(session.secret.expose_secret()).map_err(|_| {
        AppError::Internal("session secret cannot be stored in a cookie".to_string())
    })?;

    set_sentry_user(&account_id, None);

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);

    Ok((
        headers,
        Json(SessionResponse {
            session_id: session.session_id,
        }),
    )
        .into_response())
}

/// Sign out: delete the remote session best-effort, then clear the cookie
/// and redirect to the sign-in entry point no matter what.
///
/// # Route
///
/// `POST /auth/sign-out`
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(secret) = session_secret(&headers) {
        state.identity().sign_out(&secret).await;
    }

    clear_sentry_user();

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, clear_session_cookie());

    (response_headers, Redirect::to(SIGN_IN_PATH)).into_response()
}

/// Return the currently signed-in user.
///
/// # Route
///
/// `GET /auth/me`
pub async fn me(OptionalUser(user): OptionalUser) -> Result<Json<UserRecord>> {
    user.map(Json)
        .ok_or_else(|| AppError::Unauthorized("no active session".to_string()))
}
