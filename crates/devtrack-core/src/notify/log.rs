// # Log Notifier
//
// Notifier that only records messages in the log.
//
// Used when no email provider is configured, and by tests and demos.

use async_trait::async_trait;

use crate::Error;
use crate::traits::{EmailMessage, Notifier};

/// Notifier that logs each message at `info` level instead of sending it
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), Error> {
        tracing::info!(
            to = %message.to_email,
            subject = %message.subject,
            "Email not sent (log notifier): {}",
            message.body
        );
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "log"
    }
}
