use std::fmt;

use serde::{Deserialize, Serialize};

/// What a one-time code unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    /// Confirms the mailbox of a new email account.
    Verify,
    /// Authorizes a password change.
    Reset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Verify => "verify",
            OtpPurpose::Reset => "reset",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live one-time code. One per (purpose, email); a new code replaces
/// the old one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    pub email: String,
    pub purpose: OtpPurpose,
    pub code: String,
    /// Unix seconds after which the code is dead.
    pub expires_at: i64,
    /// Failed verification attempts so far.
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub created_at: String,
}

impl OtpRecord {
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}

/// Input for send-otp / resend-otp.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendOtpInput {
    #[serde(default)]
    pub email: Option<String>,
}

/// Input for verify-otp.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyOtpInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
}
