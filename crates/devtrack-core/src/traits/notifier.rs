// # Notifier Trait
//
// Defines the interface for outbound email notifications.
//
// ## Implementations
//
// - Logging only: `LogNotifier` (this crate)
// - SendGrid: `devtrack-notify-sendgrid` crate

use async_trait::async_trait;

/// A single plain-text email
///
/// The sender address is part of the notifier's own configuration, the
/// message only names the recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address
    pub to_email: String,
    /// Recipient display name
    pub to_name: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

impl EmailMessage {
    /// Create a new email message
    pub fn new(
        to_email: impl Into<String>,
        to_name: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to_email: to_email.into(),
            to_name: to_name.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// The dispatch announcement sent when a package is registered
    pub fn dispatched(
        to_email: impl Into<String>,
        to_name: impl Into<String>,
        code: &str,
    ) -> Self {
        Self::new(
            to_email,
            to_name,
            "Your package was dispatched.",
            format!("Your package with code {code} was dispatched."),
        )
    }
}

/// Trait for notifier implementations
///
/// Notifiers are single-shot: one provider call per `send`, no retries and
/// no background tasks. The caller decides what a failure means.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one email
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider accepted the message
    /// - `Err(Error)`: Transmission failed or was rejected
    async fn send(&self, message: &EmailMessage) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}
