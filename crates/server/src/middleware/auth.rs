//! Authentication extractors.
//!
//! Provides extractors that resolve the current user from the session
//! cookie via the identity gateway.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use crate::middleware::session::session_secret;
use crate::models::UserRecord;
use crate::state::AppState;

/// Fixed entry point unauthenticated requests are redirected to.
pub const SIGN_IN_PATH: &str = "/sign-in";

/// Extractor that requires an authenticated user.
///
/// If no user can be resolved from the session cookie, the request is
/// redirected to the sign-in entry point. Absence is indistinguishable
/// from a transient resolution failure by design.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.full_name)
/// }
/// ```
pub struct RequireUser(pub UserRecord);

/// Rejection for [`RequireUser`]: redirect to the sign-in entry point.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        Redirect::to(SIGN_IN_PATH).into_response()
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = session_secret(&parts.headers);

        state
            .identity()
            .current_user(secret.as_deref())
            .await
            .map(Self)
            .ok_or(AuthRejection)
    }
}

/// Extractor that optionally resolves the current user.
///
/// Unlike [`RequireUser`], this does not reject the request when nobody
/// is signed in.
pub struct OptionalUser(pub Option<UserRecord>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = session_secret(&parts.headers);
        let user = state.identity().current_user(secret.as_deref()).await;

        Ok(Self(user))
    }
}
