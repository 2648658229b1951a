//! Outgoing mail.
//!
//! The service only knows the `Mailer` trait. The binary injects the
//! concrete sender at startup.

use thiserror::Error;
use tracing::info;

/// A plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Pluggable mail sender.
pub trait Mailer: Send + Sync + 'static {
    fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Writes every message to the log instead of delivering it.
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

impl Mailer for LogMailer {
    fn send(&self, email: &Email) -> Result<(), MailError> {
        info!(
            from = %self.sender,
            to = %email.to,
            subject = %email.subject,
            "outgoing mail:\n{}",
            email.body
        );
        Ok(())
    }
}

/// Body of an OTP mail.
pub fn otp_email(to: &str, code: &str, ttl_minutes: i64) -> Email {
    Email {
        to: to.to_string(),
        subject: "Your AIDIY OTP Code".to_string(),
        body: format!(
            "Your OTP code is: {code}\n\
             It expires in {ttl_minutes} minutes.\n\n\
             If you did not request this, please ignore this email."
        ),
    }
}
