use serde::{Deserialize, Serialize};

use super::LoginType;

/// A JWT session record, used for logout and revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session id (UUIDv4, no dashes).
    pub id: String,

    /// Email of the account that owns this session.
    pub email: String,

    /// RFC 3339 timestamp when the token was issued.
    pub issued_at: String,

    /// Unix seconds when the token expires.
    pub expires_at: i64,

    /// Whether this session has been revoked.
    #[serde(default)]
    pub revoked: bool,
}

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: account email.
    pub sub: String,

    /// User display name.
    pub name: String,

    /// Login type of the account.
    pub kind: LoginType,

    /// Session id (for logout/revoke).
    pub sid: String,

    /// Issued at (unix timestamp).
    pub iat: i64,

    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Input for Google login.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleLoginInput {
    /// Google ID token (the `credential` from Google Identity Services).
    #[serde(default)]
    pub token: Option<String>,
}
