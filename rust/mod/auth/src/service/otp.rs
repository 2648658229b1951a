//! OTP lifecycle: issue, mail, verify, purge.

use rand::Rng;
use tracing::{debug, info, warn};

use aidiy_core::{normalize_email, now_unix};

use crate::mailer::otp_email;
use crate::model::{OtpPurpose, OtpRecord};
use crate::service::{required, AuthError, AuthService};
use crate::store_impls::otp_key;

/// Random numeric code of `len` digits (leading zeros allowed).
pub fn random_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Whole minutes covering `ttl_secs`, rounded up.
fn ttl_minutes(ttl_secs: i64) -> i64 {
    (ttl_secs.max(1) + 59) / 60
}

impl AuthService {
    /// Generate, store and mail a fresh code for (purpose, email).
    ///
    /// Any previous code for the same pair is replaced and its attempt
    /// counter reset. A mail failure is logged, not returned.
    pub fn issue_otp(&self, purpose: OtpPurpose, email: &str) -> Result<OtpRecord, AuthError> {
        let code = random_code(self.config.otp_length);
        let record = OtpRecord {
            email: email.to_string(),
            purpose,
            code,
            expires_at: now_unix() + self.config.otp_ttl,
            attempts: 0,
            created_at: String::new(),
        };
        let record = self.otps.save(record)?;
        info!(%purpose, email, "OTP issued");

        let mail = otp_email(email, &record.code, ttl_minutes(self.config.otp_ttl));
        if let Err(e) = self.mailer.send(&mail) {
            warn!(email, "failed to send OTP email: {}", e);
        }
        Ok(record)
    }

    /// POST /api/auth/send-otp (and resend-otp).
    ///
    /// Only unverified accounts get a verification code.
    pub fn send_verification_otp(&self, email: &Option<String>) -> Result<(), AuthError> {
        let email = normalize_email(required(email, "Email required")?);
        let user = self
            .find_user(&email)?
            .ok_or_else(|| AuthError::NotFound("User not found".into()))?;
        if user.is_verified {
            return Err(AuthError::Validation("User already verified".into()));
        }
        self.issue_otp(OtpPurpose::Verify, &email)?;
        Ok(())
    }

    /// Check a submitted code against the live record for (purpose, email).
    ///
    /// On success the record is consumed. An expired record is deleted; a
    /// wrong guess bumps the attempt counter; once the counter reaches the
    /// limit every further guess is refused, right or wrong.
    pub fn check_otp(&self, purpose: OtpPurpose, email: &str, code: &str) -> Result<(), AuthError> {
        let key = otp_key(purpose, email);
        let mut record = self
            .otps
            .get(&key)?
            .ok_or_else(|| AuthError::NotFound("No OTP found".into()))?;

        if record.is_expired(now_unix()) {
            self.otps.delete(&key)?;
            return Err(AuthError::Validation("OTP expired".into()));
        }
        if record.attempts >= self.config.otp_max_attempts {
            return Err(AuthError::Validation("Max attempts exceeded".into()));
        }
        if code.trim() != record.code {
            record.attempts += 1;
            debug!(%purpose, email, attempts = record.attempts, "incorrect OTP");
            self.otps.save(record)?;
            return Err(AuthError::Validation("Incorrect OTP".into()));
        }

        self.otps.delete(&key)?;
        Ok(())
    }

    /// POST /api/auth/verify-otp: consume a verification code and mark
    /// the account verified.
    pub fn verify_email(&self, email: &Option<String>, otp: &Option<String>) -> Result<(), AuthError> {
        let email = normalize_email(required(email, "Email and OTP required")?);
        let code = required(otp, "Email and OTP required")?;

        let mut user = self
            .find_user(&email)?
            .ok_or_else(|| AuthError::NotFound("User not found".into()))?;
        self.check_otp(OtpPurpose::Verify, &email, code)?;

        user.is_verified = true;
        self.users.save(user)?;
        info!(email = %email, "email verified");
        Ok(())
    }

    /// Delete every expired OTP record. Returns how many were removed.
    pub fn purge_expired_otps(&self) -> Result<usize, AuthError> {
        let now = now_unix();
        Ok(self.otps.delete_where(|r| r.is_expired(now))?)
    }
}
