//! Outbound Mail
//!
//! [`MailDispatcher`] builds a message on the caller's task, where address
//! and builder errors can still be reported, and then delivers it on Tokio's
//! blocking pool. Delivery is fire-and-forget: the outcome is logged and the
//! join handle is returned for callers that want to wait.
//!
//! Senders:
//! - [`SmtpMailSender`]: STARTTLS relay with credentials (lettre)
//! - [`LogMailSender`]: logs instead of sending, for local development
//! - [`MemoryMailSender`]: records messages in memory

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use lettre::address::AddressError;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid mail address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("Failed to build mail message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Mail rejected: {0}")]
    Rejected(String),
}

// ============================================================================
// Outgoing mail
// ============================================================================

/// A fully built HTML message.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    to: Mailbox,
    from: Mailbox,
    subject: String,
    html_body: String,
    message: Message,
}

impl OutgoingMail {
    pub fn new(to: &str, subject: &str, from: &str, html_body: &str) -> Result<Self, MailError> {
        let to = parse_mailbox(to)?;
        let from = parse_mailbox(from)?;

        let message = Message::builder()
            .from(from.clone())
            .to(to.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        Ok(Self {
            to,
            from,
            subject: subject.to_string(),
            html_body: html_body.to_string(),
            message,
        })
    }

    pub fn to(&self) -> &Mailbox {
        &self.to
    }

    pub fn from(&self) -> &Mailbox {
        &self.from
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn html_body(&self) -> &str {
        &self.html_body
    }

    pub fn message(&self) -> &Message {
        &self.message
    }
}

/// Whether `address` can be used as a recipient or sender.
pub fn is_valid_address(address: &str) -> bool {
    parse_mailbox(address).is_ok()
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|source| MailError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

// ============================================================================
// Senders
// ============================================================================

/// Blocking mail transport. Called from the blocking pool only.
pub trait MailSender: Send + Sync {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// SMTP relay settings
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// STARTTLS SMTP sender
pub struct SmtpMailSender {
    transport: SmtpTransport,
}

impl SmtpMailSender {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let transport = SmtpTransport::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(30)))
            .build();

        Ok(Self { transport })
    }
}

impl MailSender for SmtpMailSender {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        self.transport.send(mail.message())?;
        Ok(())
    }
}

/// Logs messages instead of delivering them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailSender;

impl MailSender for LogMailSender {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to(),
            from = %mail.from(),
            subject = %mail.subject(),
            body = %mail.html_body(),
            "SMTP not configured, mail logged instead of sent"
        );
        Ok(())
    }
}

/// A message captured by [`MemoryMailSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html_body: String,
}

/// Records every message in memory. Can be switched to reject everything.
#[derive(Debug, Default)]
pub struct MemoryMailSender {
    outbox: Mutex<Vec<SentMail>>,
    reject: bool,
}

impl MemoryMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every delivery fails.
    pub fn rejecting() -> Self {
        Self {
            outbox: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Poll until at least `count` messages were delivered or two seconds
    /// have passed, then return what arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<SentMail> {
        for _ in 0..200 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent()
    }
}

impl MailSender for MemoryMailSender {
    fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if self.reject {
            return Err(MailError::Rejected(format!("delivery to {} refused", mail.to())));
        }

        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMail {
                to: mail.to().email.to_string(),
                from: mail.from().email.to_string(),
                subject: mail.subject().to_string(),
                html_body: mail.html_body().to_string(),
            });
        Ok(())
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Hands messages to a [`MailSender`] on the blocking pool.
#[derive(Clone)]
pub struct MailDispatcher {
    sender: Arc<dyn MailSender>,
}

impl MailDispatcher {
    pub fn new(sender: Arc<dyn MailSender>) -> Self {
        Self { sender }
    }

    /// Build the message now, deliver it in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(
        &self,
        to: &str,
        subject: &str,
        from: &str,
        html_body: &str,
    ) -> Result<JoinHandle<()>, MailError> {
        let mail = OutgoingMail::new(to, subject, from, html_body)?;
        let sender = Arc::clone(&self.sender);

        Ok(tokio::task::spawn_blocking(move || {
            match sender.send(&mail) {
                Ok(()) => {
                    tracing::info!(to = %mail.to(), subject = %mail.subject(), "Mail delivered");
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        to = %mail.to(),
                        subject = %mail.subject(),
                        "Mail delivery failed"
                    );
                }
            }
        }))
    }
}

impl std::fmt::Debug for MailDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_mail_rejects_bad_sender() {
        let result = OutgoingMail::new("jane@example.com", "Hi", "not an address", "<p>x</p>");
        assert!(matches!(result, Err(MailError::InvalidAddress { .. })));
    }

    #[test]
    fn test_outgoing_mail_accepts_display_name() {
        let mail = OutgoingMail::new(
            "jane@example.com",
            "Confirm",
            "DropJar <no-reply@dropjar.test>",
            "<p>hello</p>",
        )
        .unwrap();
        assert_eq!(mail.from().email.to_string(), "no-reply@dropjar.test");
        assert_eq!(mail.subject(), "Confirm");
    }

    #[tokio::test]
    async fn test_dispatch_delivers_in_background() {
        let sender = Arc::new(MemoryMailSender::new());
        let dispatcher = MailDispatcher::new(sender.clone());

        let handle = dispatcher
            .dispatch("jane@example.com", "Confirm", "no-reply@dropjar.test", "<a>link</a>")
            .unwrap();
        handle.await.unwrap();

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@example.com");
        assert_eq!(sent[0].html_body, "<a>link</a>");
    }

    #[tokio::test]
    async fn test_dispatch_swallows_transport_failure() {
        let sender = Arc::new(MemoryMailSender::rejecting());
        let dispatcher = MailDispatcher::new(sender.clone());

        let handle = dispatcher
            .dispatch("jane@example.com", "Confirm", "no-reply@dropjar.test", "body")
            .unwrap();

        // The task completes normally; the failure is only logged.
        assert!(handle.await.is_ok());
        assert!(sender.sent().is_empty());
    }

    #[test]
    fn test_dispatch_reports_build_errors_synchronously() {
        let dispatcher = MailDispatcher::new(Arc::new(MemoryMailSender::new()));
        let result = dispatcher.dispatch("bad", "s", "no-reply@dropjar.test", "b");
        assert!(matches!(result, Err(MailError::InvalidAddress { .. })));
    }
}
