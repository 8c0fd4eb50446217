//! Identity gateway.
//!
//! Orchestrates the OTP email sign-in flow against the storage platform:
//! account lookup, OTP issuance, account provisioning, OTP verification,
//! current-user resolution, and sign-out.
//!
//! Two error policies coexist here. Operations a caller must react to
//! (OTP issuance, account creation, verification, sign-in lookup) log and
//! re-raise their errors. Operations where forward progress wins
//! (current-user resolution, sign-out cleanup) log and swallow, collapsing
//! failure into "no user" or "done".

use std::sync::Arc;

use thiserror::Error;

use stratus_core::{AccountId, Email};

use crate::models::{EstablishedSession, NewUserRecord, SignInOutcome, UserRecord};
use crate::platform::{Platform, PlatformError};

/// Errors surfaced by the log-and-rethrow operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The platform accepted the OTP request but issued no account id.
    #[error("one-time passcode was not sent")]
    OtpNotSent,

    /// The platform call failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Gateway over the platform's auth and user-record capabilities.
///
/// Constructed with an injected [`Platform`] implementation so tests can
/// substitute a fake.
pub struct IdentityGateway<P> {
    platform: Arc<P>,
    placeholder_avatar: String,
}

impl<P: Platform> IdentityGateway<P> {
    /// Create a new gateway.
    pub fn new(platform: Arc<P>, placeholder_avatar: impl Into<String>) -> Self {
        Self {
            platform,
            placeholder_avatar: placeholder_avatar.into(),
        }
    }

    /// Look up a user record by email.
    ///
    /// Zero matches is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only when the platform call fails.
    pub async fn lookup_user_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserRecord>, IdentityError> {
        Ok(self.platform.find_user_by_email(email).await?)
    }

    /// Ask the platform to email a one-time passcode.
    ///
    /// Single attempt; no retry.
    ///
    /// # Errors
    ///
    /// Returns an error when the platform call fails.
    pub async fn send_email_otp(&self, email: &Email) -> Result<AccountId, IdentityError> {
        match self.platform.create_email_token(email).await {
            Ok(account_id) => Ok(account_id),
            Err(e) => {
                tracing::error!(error = %e, "failed to send email OTP");
                Err(e.into())
            }
        }
    }

    /// Create an account for an email, sending an OTP either way.
    ///
    /// A user record is created only when none exists for the email. The
    /// existence check and the create are not transactional; concurrent
    /// first sign-ups for one email can race and create duplicate records.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::OtpNotSent`] when the platform issued no
    /// account id, or the underlying platform error.
    pub async fn create_account(
        &self,
        full_name: &str,
        email: &Email,
    ) -> Result<AccountId, IdentityError> {
        let existing = self.platform.find_user_by_email(email).await.map_err(|e| {
            tracing::error!(error = %e, "failed to look up user by email");
            e
        })?;

        let account_id = self.send_email_otp(email).await?;
        if account_id.as_str().is_empty() {
            tracing::error!("platform issued no account id for OTP");
            return Err(IdentityError::OtpNotSent);
        }

        if existing.is_none() {
            let record = NewUserRecord {
                full_name: full_name.to_owned(),
                email: email.clone(),
                avatar: self.placeholder_avatar.clone(),
                account_id: account_id.clone(),
            };
            self.platform.create_user_record(record).await.map_err(|e| {
                tracing::error!(error = %e, "failed to create user record");
                e
            })?;
        }

        Ok(account_id)
    }

    /// Exchange an account id and emailed passcode for a session.
    ///
    /// The caller is responsible for persisting the secret in the session
    /// cookie; no cookie is written when verification fails.
    ///
    /// # Errors
    ///
    /// Returns the platform error when verification fails.
    pub async fn verify_otp(
        &self,
        account_id: &AccountId,
        passcode: &str,
    ) -> Result<EstablishedSession, IdentityError> {
        match self.platform.create_session(account_id, passcode).await {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::error!(error = %e, "unable to verify OTP");
                Err(e.into())
            }
        }
    }

    /// Resolve the user behind a session secret.
    ///
    /// Any failure (no secret, dead session, transport error, missing user
    /// record) is logged and collapses to `None`; callers treat absence as
    /// "unauthenticated" and cannot distinguish it from transient failure.
    pub async fn current_user(&self, session_secret: Option<&str>) -> Option<UserRecord> {
        let secret = session_secret?;

        match self.resolve_user(secret).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "failed to resolve current user");
                None
            }
        }
    }

    async fn resolve_user(&self, secret: &str) -> Result<Option<UserRecord>, PlatformError> {
        let account = self.platform.get_account(secret).await?;
        self.platform.find_user_by_account_id(&account.id).await
    }

    /// Delete the remote session, best effort.
    ///
    /// Failure is logged and never surfaced; the caller clears the cookie
    /// and redirects regardless.
    pub async fn sign_out(&self, session_secret: &str) {
        if let Err(e) = self.platform.delete_current_session(session_secret).await {
            tracing::warn!(error = %e, "failed to delete remote session during sign-out");
        }
    }

    /// Sign in an existing user: look up the record and send a fresh OTP.
    ///
    /// An unknown email is reported as data in the outcome, not as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup or OTP issuance fails.
    pub async fn sign_in_user(&self, email: &Email) -> Result<SignInOutcome, IdentityError> {
        let existing = self.platform.find_user_by_email(email).await.map_err(|e| {
            tracing::error!(error = %e, "failed to look up user for sign-in");
            e
        })?;

        match existing {
            Some(user) => {
                self.send_email_otp(email).await?;
                Ok(SignInOutcome::sent(user.account_id))
            }
            None => Ok(SignInOutcome::not_found()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use secrecy::{ExposeSecret, SecretString};
    use tokio::sync::Barrier;

    use stratus_core::DocumentId;

    use super::*;
    use crate::models::AccountIdentity;

    const PLACEHOLDER_AVATAR: &str = "https://example.com/avatar-placeholder.png";
    const VALID_PASSCODE: &str = "123456";

    /// In-memory platform fake covering the identity capability set.
    #[derive(Default)]
    struct FakePlatform {
        users: Mutex<Vec<UserRecord>>,
        /// Stable account id per email, like the real auth service.
        accounts: Mutex<HashMap<String, AccountId>>,
        /// Session secret -> account.
        sessions: Mutex<HashMap<String, AccountId>>,
        next_id: AtomicU64,
        /// Issue OTPs with an empty account id.
        issue_empty_account_id: bool,
        /// Fail OTP issuance outright.
        fail_otp: bool,
        /// Fail remote session deletion.
        fail_delete_session: bool,
        /// Rendezvous inside `create_email_token`, after the existence
        /// check and before the record create, to interleave two calls.
        otp_barrier: Option<Barrier>,
    }

    impl FakePlatform {
        fn transport_error() -> PlatformError {
            PlatformError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            }
        }

        fn user_count(&self) -> usize {
            self.users.lock().unwrap().len()
        }

        fn next(&self, prefix: &str) -> String {
            format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
        }
    }

    #[async_trait]
    impl Platform for FakePlatform {
        async fn find_user_by_email(
            &self,
            email: &Email,
        ) -> Result<Option<UserRecord>, PlatformError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| &u.email == email).cloned())
        }

        async fn find_user_by_account_id(
            &self,
            account_id: &AccountId,
        ) -> Result<Option<UserRecord>, PlatformError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| &u.account_id == account_id).cloned())
        }

        async fn create_user_record(
            &self,
            user: NewUserRecord,
        ) -> Result<UserRecord, PlatformError> {
            let record = UserRecord {
                id: DocumentId::new(self.next("doc")),
                full_name: user.full_name,
                email: user.email,
                avatar: user.avatar,
                account_id: user.account_id,
                created_at: Utc::now(),
            };
            self.users.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn create_email_token(&self, email: &Email) -> Result<AccountId, PlatformError> {
            if let Some(barrier) = &self.otp_barrier {
                barrier.wait().await;
            }
            if self.fail_otp {
                return Err(Self::transport_error());
            }
            if self.issue_empty_account_id {
                return Ok(AccountId::new(""));
            }

            let mut accounts = self.accounts.lock().unwrap();
            let account_id = accounts
                .entry(email.as_str().to_owned())
                .or_insert_with(|| AccountId::new(self.next("acc")))
                .clone();
            Ok(account_id)
        }

        async fn create_session(
            &self,
            account_id: &AccountId,
            secret: &str,
        ) -> Result<EstablishedSession, PlatformError> {
            if secret != VALID_PASSCODE {
                return Err(PlatformError::Api {
                    status: 401,
                    message: "invalid token".to_string(),
                });
            }

            let session_secret = self.next("sess-secret");
            self.sessions
                .lock()
                .unwrap()
                .insert(session_secret.clone(), account_id.clone());

            Ok(EstablishedSession {
                session_id: stratus_core::SessionId::new(self.next("sess")),
                secret: SecretString::from(session_secret),
            })
        }

        async fn get_account(
            &self,
            session_secret: &str,
        ) -> Result<AccountIdentity, PlatformError> {
            let sessions = self.sessions.lock().unwrap();
            match sessions.get(session_secret) {
                Some(account_id) => Ok(AccountIdentity {
                    id: account_id.clone(),
                    email: None,
                }),
                None => Err(PlatformError::Api {
                    status: 401,
                    message: "missing scope".to_string(),
                }),
            }
        }

        async fn delete_current_session(&self, session_secret: &str) -> Result<(), PlatformError> {
            if self.fail_delete_session {
                return Err(Self::transport_error());
            }
            self.sessions.lock().unwrap().remove(session_secret);
            Ok(())
        }
    }

    fn gateway(platform: FakePlatform) -> IdentityGateway<FakePlatform> {
        IdentityGateway::new(Arc::new(platform), PLACEHOLDER_AVATAR)
    }

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_create_account_new_email_creates_one_record() {
        let gateway = gateway(FakePlatform::default());

        let account_id = gateway
            .create_account("Ada Lovelace", &email("ada@example.com"))
            .await
            .unwrap();

        assert!(!account_id.as_str().is_empty());
        assert_eq!(gateway.platform.user_count(), 1);

        let record = gateway
            .lookup_user_by_email(&email("ada@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.avatar, PLACEHOLDER_AVATAR);
        assert_eq!(record.account_id, account_id);
    }

    #[tokio::test]
    async fn test_create_account_existing_email_reuses_record() {
        let gateway = gateway(FakePlatform::default());
        let ada = email("ada@example.com");

        let first = gateway.create_account("Ada Lovelace", &ada).await.unwrap();
        let second = gateway.create_account("Ada L.", &ada).await.unwrap();

        // No second record; the original account id comes back
        assert_eq!(gateway.platform.user_count(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_create_account_fails_when_no_account_id_issued() {
        let gateway = gateway(FakePlatform {
            issue_empty_account_id: true,
            ..FakePlatform::default()
        });

        let result = gateway
            .create_account("Ada Lovelace", &email("ada@example.com"))
            .await;

        assert!(matches!(result, Err(IdentityError::OtpNotSent)));
        // Fatal before record creation
        assert_eq!(gateway.platform.user_count(), 0);
    }

    #[tokio::test]
    async fn test_create_account_propagates_otp_failure() {
        let gateway = gateway(FakePlatform {
            fail_otp: true,
            ..FakePlatform::default()
        });

        let result = gateway
            .create_account("Ada Lovelace", &email("ada@example.com"))
            .await;

        assert!(matches!(result, Err(IdentityError::Platform(_))));
        assert_eq!(gateway.platform.user_count(), 0);
    }

    #[tokio::test]
    async fn test_sign_in_unknown_email_reports_absence_as_data() {
        let gateway = gateway(FakePlatform::default());

        let outcome = gateway
            .sign_in_user(&email("unknown@x.com"))
            .await
            .unwrap();

        assert!(outcome.account_id.is_none());
        assert!(outcome.error.as_deref().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_sign_in_existing_email_returns_stored_account_id() {
        let gateway = gateway(FakePlatform::default());
        let ada = email("ada@example.com");
        let account_id = gateway.create_account("Ada Lovelace", &ada).await.unwrap();

        let outcome = gateway.sign_in_user(&ada).await.unwrap();

        assert_eq!(outcome.account_id, Some(account_id));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_verify_otp_establishes_session() {
        let gateway = gateway(FakePlatform::default());
        let ada = email("ada@example.com");
        let account_id = gateway.create_account("Ada Lovelace", &ada).await.unwrap();

        let session = gateway
            .verify_otp(&account_id, VALID_PASSCODE)
            .await
            .unwrap();
        assert!(!session.secret.expose_secret().is_empty());

        // The session resolves back to the user record
        let user = gateway
            .current_user(Some(session.secret.expose_secret()))
            .await
            .unwrap();
        assert_eq!(user.email, ada);
    }

    #[tokio::test]
    async fn test_verify_otp_wrong_passcode_is_rejected() {
        let gateway = gateway(FakePlatform::default());
        let account_id = gateway
            .create_account("Ada Lovelace", &email("ada@example.com"))
            .await
            .unwrap();

        let result = gateway.verify_otp(&account_id, "000000").await;

        match result {
            Err(IdentityError::Platform(e)) => assert!(e.is_client_error()),
            other => panic!("expected platform error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_current_user_without_secret_is_absent() {
        let gateway = gateway(FakePlatform::default());
        assert!(gateway.current_user(None).await.is_none());
    }

    #[tokio::test]
    async fn test_current_user_with_dead_session_is_absent_not_error() {
        let gateway = gateway(FakePlatform::default());
        assert!(gateway.current_user(Some("stale-secret")).await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_swallows_remote_failure() {
        let gateway = gateway(FakePlatform {
            fail_delete_session: true,
            ..FakePlatform::default()
        });

        // Must not panic or surface the failure
        gateway.sign_out("some-secret").await;
    }

    #[tokio::test]
    async fn test_concurrent_first_sign_ups_can_duplicate_records() {
        // Documents the accepted check-then-create race: both calls pass
        // the existence check before either creates a record.
        let gateway = gateway(FakePlatform {
            otp_barrier: Some(Barrier::new(2)),
            ..FakePlatform::default()
        });
        let ada = email("ada@example.com");

        let (a, b) = tokio::join!(
            gateway.create_account("Ada Lovelace", &ada),
            gateway.create_account("Ada Lovelace", &ada),
        );

        a.unwrap();
        b.unwrap();
        assert_eq!(gateway.platform.user_count(), 2);
    }
}
