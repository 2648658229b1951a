//! Test doubles shared by the service and API tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use aidiy_kv::MemoryStore;

use crate::mailer::{Email, MailError, Mailer};
use crate::service::{AuthConfig, AuthError, AuthService, GoogleIdentity, GoogleVerifier};

pub const GOOGLE_CLIENT_ID: &str = "test-client.apps.googleusercontent.com";
/// The only ID token the stub verifier accepts.
pub const GOOGLE_TOKEN: &str = "google-token-for-gina";
/// Valid token whose Google account has not verified its email.
pub const GOOGLE_UNVERIFIED_TOKEN: &str = "google-token-for-uma";

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, email: &Email) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

struct FailingMailer;

impl Mailer for FailingMailer {
    fn send(&self, _email: &Email) -> Result<(), MailError> {
        Err(MailError("smtp unreachable".into()))
    }
}

/// Accepts [`GOOGLE_TOKEN`] and [`GOOGLE_UNVERIFIED_TOKEN`].
pub struct StubGoogle;

#[async_trait]
impl GoogleVerifier for StubGoogle {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError> {
        match id_token {
            GOOGLE_TOKEN => Ok(GoogleIdentity {
                email: "Gina@Gmail.com".into(),
                email_verified: true,
                name: Some("Gina Green".into()),
                given_name: Some("Gina".into()),
                family_name: Some("Green".into()),
                picture: Some("https://lh3.googleusercontent.com/gina".into()),
            }),
            GOOGLE_UNVERIFIED_TOKEN => Ok(GoogleIdentity {
                email: "uma@gmail.com".into(),
                email_verified: false,
                name: Some("Uma".into()),
                ..Default::default()
            }),
            _ => Err(AuthError::Unauthorized("Invalid Google token".into())),
        }
    }
}

pub struct TestHarness {
    pub svc: Arc<AuthService>,
    pub mailer: Arc<RecordingMailer>,
}

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret".into(),
        google_client_id: GOOGLE_CLIENT_ID.into(),
        ..Default::default()
    }
}

/// Service over an empty in-memory store with a recording mailer.
pub fn test_service() -> TestHarness {
    let mailer = Arc::new(RecordingMailer::default());
    let svc = AuthService::new(
        Arc::new(MemoryStore::new()),
        mailer.clone(),
        Arc::new(StubGoogle),
        test_config(),
    );
    TestHarness { svc, mailer }
}

/// Service whose mailer always fails.
pub fn test_service_with_failing_mailer() -> TestHarness {
    let svc = AuthService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(FailingMailer),
        Arc::new(StubGoogle),
        test_config(),
    );
    TestHarness {
        svc,
        mailer: Arc::new(RecordingMailer::default()),
    }
}

/// The code carried by the most recent OTP mail.
pub fn last_code(h: &TestHarness) -> String {
    let mail = h.mailer.sent().pop().expect("no mail sent");
    mail.body
        .lines()
        .find_map(|l| l.strip_prefix("Your OTP code is: "))
        .expect("mail without code")
        .trim()
        .to_string()
}
