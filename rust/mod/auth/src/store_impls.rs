//! KvStore implementations for auth models.
//!
//! Defines kv_prefix, key_value, and hooks for each model.

use aidiy_core::{new_id, now_rfc3339};
use aidiy_store::KvStore;

use crate::model::*;

// ── Password helpers ──

/// Hash a plain password with argon2id.
pub fn hash_password(password: &str) -> Result<String, String> {
    use argon2::Argon2;
    use password_hash::rand_core::OsRng;
    use password_hash::{PasswordHasher, SaltString};

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| e.to_string())
}

/// Verify a password against an argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::Argon2;
    use password_hash::{PasswordHash, PasswordVerifier};

    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ── User ──

impl KvStore for User {
    const KIND: &'static str = "user";

    fn kv_prefix() -> &'static str {
        "aidiy:user:"
    }

    fn key_value(&self) -> String {
        self.email.clone()
    }

    fn before_create(&mut self) {
        let now = now_rfc3339();
        if self.created_at.is_empty() {
            self.created_at = now.clone();
        }
        self.updated_at = now;
    }

    fn before_update(&mut self) {
        self.updated_at = now_rfc3339();
    }
}

// ── OTP ──

impl KvStore for OtpRecord {
    const KIND: &'static str = "otp";

    fn kv_prefix() -> &'static str {
        "aidiy:otp:"
    }

    fn key_value(&self) -> String {
        otp_key(self.purpose, &self.email)
    }

    fn before_update(&mut self) {
        if self.created_at.is_empty() {
            self.created_at = now_rfc3339();
        }
    }
}

/// Key suffix of the OTP record for (purpose, email).
pub fn otp_key(purpose: OtpPurpose, email: &str) -> String {
    format!("{}:{}", purpose, email)
}

// ── Child ──

impl KvStore for Child {
    const KIND: &'static str = "child";

    fn kv_prefix() -> &'static str {
        "aidiy:child:"
    }

    fn key_value(&self) -> String {
        child_key(&self.parent_email, &self.login_code)
    }

    fn before_update(&mut self) {
        let now = now_rfc3339();
        if self.created_at.is_empty() {
            self.created_at = now.clone();
        }
        self.updated_at = now;
    }
}

/// Key suffix of a child.
pub fn child_key(parent_email: &str, login_code: &str) -> String {
    format!("{}:{}", parent_email, login_code)
}

// ── Session ──

impl KvStore for Session {
    const KIND: &'static str = "session";

    fn kv_prefix() -> &'static str {
        "aidiy:session:"
    }

    fn key_value(&self) -> String {
        self.id.clone()
    }

    fn before_create(&mut self) {
        if self.id.is_empty() {
            self.id = new_id();
        }
        if self.issued_at.is_empty() {
            self.issued_at = now_rfc3339();
        }
    }
}
