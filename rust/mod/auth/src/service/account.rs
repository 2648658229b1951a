use tracing::{info, warn};

use aidiy_core::normalize_email;

use crate::model::{
    LoginInput, LoginResult, LoginType, OtpPurpose, RegisterInput, ResetPasswordInput, User,
};
use crate::service::{non_blank, required, AuthError, AuthService};
use crate::store_impls::{hash_password, verify_password};

/// Shortest password accepted by the reset flow.
pub const MIN_PASSWORD_LEN: usize = 6;

/// What a reset-password call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// A reset code was mailed.
    CodeSent,
    /// The password was replaced.
    PasswordChanged,
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

impl AuthService {
    /// POST /api/auth/register: create an unverified email account and
    /// mail it a verification code.
    pub fn register(&self, input: &RegisterInput) -> Result<User, AuthError> {
        const MISSING: &str = "Missing required fields";
        let first = required(&input.first_name, MISSING)?;
        let last = required(&input.last_name, MISSING)?;
        let email = required(&input.email, MISSING)?;
        let password = input
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AuthError::Validation(MISSING.into()))?;

        let email = normalize_email(email);
        if !looks_like_email(&email) {
            return Err(AuthError::Validation("Invalid email address".into()));
        }
        if self.is_kid_email(&email) {
            return Err(AuthError::Validation("Email address is reserved".into()));
        }
        if self.find_user(&email)?.is_some() {
            return Err(AuthError::Conflict("Email already registered".into()));
        }

        let password_hash = hash_password(password).map_err(AuthError::Internal)?;
        let user = User {
            email: email.clone(),
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            name: User::full_name(first, last),
            phone_number: non_blank(&input.phone_number).map(str::to_string),
            picture: None,
            password_hash: Some(password_hash),
            is_verified: false,
            login_type: LoginType::Email,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let user = self.users.save_new(user).map_err(|e| match AuthError::from(e) {
            AuthError::Conflict(_) => AuthError::Conflict("Email already registered".into()),
            other => other,
        })?;
        info!(email = %user.email, "user registered");

        self.issue_otp(OtpPurpose::Verify, &user.email)?;
        Ok(user)
    }

    /// POST /api/auth/login: email + password.
    ///
    /// Unknown account, password-less account and wrong password all give
    /// the same 401 so callers cannot tell which emails exist.
    pub fn login(&self, input: &LoginInput) -> Result<LoginResult, AuthError> {
        const MISSING: &str = "Email and password required";
        let email = normalize_email(required(&input.email, MISSING)?);
        let password = input
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AuthError::Validation(MISSING.into()))?;

        let invalid = || AuthError::Unauthorized("Invalid email or password".into());
        let user = self.find_user(&email)?.ok_or_else(invalid)?;
        let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
        if !verify_password(password, hash) {
            warn!(email = %email, "failed login");
            return Err(invalid());
        }
        if !user.is_verified {
            return Err(AuthError::Forbidden("Account not verified".into()));
        }

        self.login_result(&user)
    }

    /// POST /api/auth/reset-password.
    ///
    /// Step one (`email` only) mails a reset code. Step two (`email`,
    /// `otp`, `newPassword`) checks the code, stores the new password and
    /// signs out every existing session.
    pub fn reset_password(&self, input: &ResetPasswordInput) -> Result<ResetOutcome, AuthError> {
        let email = normalize_email(required(&input.email, "Email required")?);
        let mut user = self
            .find_user(&email)?
            .ok_or_else(|| AuthError::NotFound("User not found".into()))?;
        if user.login_type == LoginType::Kid {
            return Err(AuthError::Validation(
                "Kid accounts sign in with their login code".into(),
            ));
        }

        let (code, new_password) = match (non_blank(&input.otp), input.new_password.as_deref()) {
            (None, None) => {
                self.issue_otp(OtpPurpose::Reset, &email)?;
                return Ok(ResetOutcome::CodeSent);
            }
            (Some(code), Some(pw)) => (code, pw),
            _ => {
                return Err(AuthError::Validation(
                    "OTP and new password required".into(),
                ))
            }
        };
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        self.check_otp(OtpPurpose::Reset, &email, code)?;

        user.password_hash = Some(hash_password(new_password).map_err(AuthError::Internal)?);
        user.is_verified = true;
        self.users.save(user)?;
        self.revoke_user_sessions(&email)?;
        info!(email = %email, "password reset");
        Ok(ResetOutcome::PasswordChanged)
    }

    /// POST /api/auth/logout: revoke the caller's session.
    pub fn logout(&self, session_id: &str) -> Result<(), AuthError> {
        self.revoke_session(session_id)
    }
}
