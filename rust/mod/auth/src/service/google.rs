//! Google sign-in with an ID token from Google Identity Services.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use aidiy_core::normalize_email;

use crate::model::{LoginResult, LoginType, User};
use crate::service::{required, AuthError, AuthService};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

/// Resolves a Google ID token to the identity it asserts.
///
/// Any failure (bad signature, wrong audience, network error) is
/// reported as `Unauthorized`.
#[async_trait]
pub trait GoogleVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError>;
}

/// Verifies tokens against Google's tokeninfo endpoint.
pub struct TokenInfoVerifier {
    client: reqwest::Client,
    client_id: String,
    endpoint: String,
}

impl TokenInfoVerifier {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: client_id.into(),
            endpoint: TOKENINFO_URL.to_string(),
        }
    }
}

/// Fields of a tokeninfo response. Google sends booleans as strings here.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    aud: String,
    #[serde(default)]
    iss: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl TokenInfo {
    fn into_identity(self, client_id: &str) -> Result<GoogleIdentity, AuthError> {
        let rejected = |why: &str| {
            debug!("google token rejected: {}", why);
            AuthError::Unauthorized("Invalid Google token".into())
        };
        if client_id.is_empty() || self.aud != client_id {
            return Err(rejected("audience mismatch"));
        }
        if !GOOGLE_ISSUERS.contains(&self.iss.as_str()) {
            return Err(rejected("unexpected issuer"));
        }
        let email = self.email.ok_or_else(|| rejected("no email claim"))?;
        let email_verified = match self.email_verified {
            Some(serde_json::Value::Bool(b)) => b,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        };
        Ok(GoogleIdentity {
            email,
            email_verified,
            name: self.name,
            given_name: self.given_name,
            family_name: self.family_name,
            picture: self.picture,
        })
    }
}

#[async_trait]
impl GoogleVerifier for TokenInfoVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| {
                warn!("tokeninfo request failed: {}", e);
                AuthError::Unauthorized("Invalid Google token".into())
            })?;

        if !resp.status().is_success() {
            debug!("tokeninfo returned {}", resp.status());
            return Err(AuthError::Unauthorized("Invalid Google token".into()));
        }

        let info: TokenInfo = resp.json().await.map_err(|e| {
            warn!("tokeninfo response parse failed: {}", e);
            AuthError::Unauthorized("Invalid Google token".into())
        })?;
        info.into_identity(&self.client_id)
    }
}

impl AuthService {
    /// POST /auth/google: sign in (or sign up) with a Google ID token.
    pub async fn google_login(&self, token: &Option<String>) -> Result<LoginResult, AuthError> {
        let token = required(token, "Token required")?;
        let identity = self.google.verify(token).await?;
        if !identity.email_verified {
            return Err(AuthError::Unauthorized("Google email not verified".into()));
        }

        let email = normalize_email(&identity.email);
        let user = match self.find_user(&email)? {
            Some(mut user) => {
                if !user.is_verified {
                    user.is_verified = true;
                    if user.picture.is_none() {
                        user.picture = identity.picture.clone();
                    }
                    user = self.users.save(user)?;
                    info!(email = %email, "account verified through google");
                }
                user
            }
            None => {
                let name = identity
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| {
                        User::full_name(
                            identity.given_name.as_deref().unwrap_or_default(),
                            identity.family_name.as_deref().unwrap_or_default(),
                        )
                    });
                let user = self.users.save_new(User {
                    email: email.clone(),
                    first_name: identity.given_name.clone(),
                    last_name: identity.family_name.clone(),
                    name: if name.is_empty() { email.clone() } else { name },
                    phone_number: None,
                    picture: identity.picture.clone(),
                    password_hash: None,
                    is_verified: true,
                    login_type: LoginType::Google,
                    created_at: String::new(),
                    updated_at: String::new(),
                })?;
                info!(email = %email, "google user created");
                user
            }
        };

        self.login_result(&user)
    }
}
