pub mod account;
pub mod children;
pub mod google;
pub mod kid;
pub mod otp;
pub mod profile;
pub mod session;

use std::sync::Arc;

use thiserror::Error;
use tracing::error;

use aidiy_core::ServiceError;
use aidiy_kv::KVStore;
use aidiy_store::KvOps;

use crate::mailer::Mailer;
use crate::model::{Child, OtpRecord, Session, User};

pub use google::{GoogleIdentity, GoogleVerifier, TokenInfoVerifier};

/// Auth service error type.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::NotFound(m) => ServiceError::NotFound(m),
            AuthError::Conflict(m) => ServiceError::Conflict(m),
            AuthError::Validation(m) => ServiceError::Validation(m),
            AuthError::Unauthorized(m) => ServiceError::Unauthorized(m),
            AuthError::Forbidden(m) => ServiceError::PermissionDenied(m),
            AuthError::Storage(m) => ServiceError::Storage(m),
            AuthError::Internal(m) => ServiceError::Internal(m),
        }
    }
}

impl From<ServiceError> for AuthError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(m) => AuthError::NotFound(m),
            ServiceError::Conflict(m) => AuthError::Conflict(m),
            ServiceError::Validation(m) => AuthError::Validation(m),
            ServiceError::Unauthorized(m) => AuthError::Unauthorized(m),
            ServiceError::PermissionDenied(m) => AuthError::Forbidden(m),
            ServiceError::Storage(m) => {
                error!("storage failure: {}", m);
                AuthError::Storage(m)
            }
            ServiceError::Internal(m) => AuthError::Internal(m),
        }
    }
}

/// Configuration for the auth service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret (HS256).
    pub jwt_secret: String,
    /// App token lifetime in seconds (default: 24h).
    pub token_ttl: i64,
    /// Number of digits in an OTP (default: 6).
    pub otp_length: usize,
    /// OTP lifetime in seconds (default: 5 min).
    pub otp_ttl: i64,
    /// Wrong guesses allowed before an OTP is locked (default: 3).
    pub otp_max_attempts: u32,
    /// OAuth client id that Google ID tokens must be issued for.
    pub google_client_id: String,
    /// Domain of synthetic kid account emails (`kid_{code}@{domain}`).
    pub kid_email_domain: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "aidiy-dev-secret-change-me".to_string(),
            token_ttl: 86400,
            otp_length: 6,
            otp_ttl: 300,
            otp_max_attempts: 3,
            google_client_id: String::new(),
            kid_email_domain: "aidiy.com".to_string(),
        }
    }
}

/// The Auth service. Holds storage handles, collaborators and configuration.
pub struct AuthService {
    pub(crate) users: KvOps<User>,
    pub(crate) otps: KvOps<OtpRecord>,
    pub(crate) children: KvOps<Child>,
    pub(crate) sessions: KvOps<Session>,
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) google: Arc<dyn GoogleVerifier>,
    pub(crate) config: AuthConfig,
}

impl AuthService {
    pub fn new(
        kv: Arc<dyn KVStore>,
        mailer: Arc<dyn Mailer>,
        google: Arc<dyn GoogleVerifier>,
        config: AuthConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            users: KvOps::new(Arc::clone(&kv)),
            otps: KvOps::new(Arc::clone(&kv)),
            children: KvOps::new(Arc::clone(&kv)),
            sessions: KvOps::new(kv),
            mailer,
            google,
            config,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Look up an account by (already normalized) email.
    pub(crate) fn find_user(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(email)?)
    }
}

/// Trimmed value of an optional field, `None` when absent or blank.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Like [`non_blank`], but a missing value is a validation error.
pub(crate) fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, AuthError> {
    non_blank(value).ok_or_else(|| AuthError::Validation(message.to_string()))
}
