//! Alert delivery via email.
//!
//! [`MailNotifier`] hands messages to the local sendmail binary by default
//! and switches to an SMTP relay when `SMTP_HOST` is set in the environment.
//! Delivery is best-effort: the dispatcher logs failures and the poll cycle
//! continues regardless.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SendmailTransport, SmtpTransport, Transport};

/// Error type for notification delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The local sendmail handoff failed.
    #[error("sendmail transport error: {0}")]
    Sendmail(#[from] lettre::transport::sendmail::Error),

    /// The recipient or sender address could not be parsed.
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The message could not be assembled.
    #[error("email build error: {0}")]
    Build(String),
}

/// Accepts (recipient, subject, body) and attempts delivery. Non-fatal on
/// failure by contract; callers log and move on.
pub trait Notifier {
    fn notify(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "trafmon@localhost";

/// Mail transport configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SMTP relay hostname; `None` selects the sendmail transport.
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl MailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable        | Required | Default              |
    /// |-----------------|----------|----------------------|
    /// | `SMTP_HOST`     | no       | — (sendmail is used) |
    /// | `SMTP_PORT`     | no       | `587`                |
    /// | `SMTP_FROM`     | no       | `trafmon@localhost`  |
    /// | `SMTP_USER`     | no       | —                    |
    /// | `SMTP_PASSWORD` | no       | —                    |
    pub fn from_env() -> Self {
        Self {
            smtp_host: std::env::var("SMTP_HOST").ok(),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        }
    }
}

/// Sends alert emails through sendmail or an SMTP relay.
pub struct MailNotifier {
    config: MailConfig,
}

impl MailNotifier {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }
}

impl Notifier for MailNotifier {
    fn notify(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        match &self.config.smtp_host {
            Some(host) => {
                let mut builder = SmtpTransport::starttls_relay(host)?.port(self.config.smtp_port);
                if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password)
                {
                    builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
                }
                builder.build().send(&email)?;
            }
            None => {
                SendmailTransport::new().send(&email)?;
            }
        }

        log::info!("notification sent to {}: {}", to, subject);
        Ok(())
    }
}
