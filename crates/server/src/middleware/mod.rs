//! Request middleware and extractors.

pub mod auth;
pub mod session;

pub use auth::{OptionalUser, RequireUser, SIGN_IN_PATH};
pub use session::{
    SESSION_COOKIE_NAME, clear_session_cookie, session_secret, set_session_cookie,
};
