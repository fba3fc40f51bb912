// # SendGrid Notifier
//
// This crate provides a SendGrid implementation of the DevTrack Notifier.
//
// ## Behavior
//
// - One HTTP request per `send` call
// - Full error propagation to the caller (the service applies its policy)
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (400, 401/403, 413, 429, 5xx)
// - Dry-run mode for safe testing
// - No retry, backoff or background tasks
//
// ## Security Requirements
//
// - API key NEVER appears in logs or Debug output
// - Notifier MUST fail fast if the key is empty
//
// ## API Reference
//
// - SendGrid v3 Mail Send: POST `/v3/mail/send`, answers 202 Accepted

use async_trait::async_trait;
use devtrack_core::config::NotifierConfig;
use devtrack_core::traits::{EmailMessage, Notifier};
use devtrack_core::{Error, Result};
use serde::Serialize;
use std::time::Duration;

/// SendGrid API base URL
const SENDGRID_API_BASE: &str = "https://api.sendgrid.com";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct MailSendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

/// SendGrid email notifier
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the notifier logs the request payload and
/// reports success without contacting SendGrid.
pub struct SendGridNotifier {
    /// SendGrid API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Verified sender address
    sender_email: String,

    /// Sender display name
    sender_name: String,

    /// API base URL
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, log the request instead of sending it
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for SendGridNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridNotifier")
            .field("api_key", &"<REDACTED>")
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl SendGridNotifier {
    /// Create a new SendGrid notifier
    ///
    /// # Parameters
    ///
    /// - `api_key`: SendGrid API key with Mail Send permission
    /// - `sender_email`: Verified sender address
    /// - `sender_name`: Sender display name
    /// - `dry_run`: If true, log requests instead of sending them
    pub fn new(
        api_key: impl Into<String>,
        sender_email: impl Into<String>,
        sender_name: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("SendGrid API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            sender_email: sender_email.into(),
            sender_name: sender_name.into(),
            base_url: SENDGRID_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a notifier from configuration
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        match config {
            NotifierConfig::SendGrid {
                api_key,
                sender_email,
                sender_name,
                base_url,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!("SendGrid notifier running in DRY-RUN mode - no email will be sent");
                }

                let notifier = Self::new(api_key, sender_email, sender_name, *dry_run)?;
                Ok(match base_url {
                    Some(url) => notifier.with_base_url(url),
                    None => notifier,
                })
            }
            _ => Err(Error::config("Invalid config for SendGrid notifier")),
        }
    }

    /// Point the notifier at another API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether requests are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn request_body<'a>(&'a self, message: &'a EmailMessage) -> MailSendRequest<'a> {
        MailSendRequest {
            personalizations: [Personalization {
                to: [Address {
                    email: &message.to_email,
                    name: &message.to_name,
                }],
            }],
            from: Address {
                email: &self.sender_email,
                name: &self.sender_name,
            },
            subject: &message.subject,
            content: [Content {
                content_type: "text/plain",
                value: &message.body,
            }],
        }
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    /// Send one plain-text email through SendGrid
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /v3/mail/send
    /// Authorization: Bearer <key>
    /// {
    ///   "personalizations": [{"to": [{"email": "...", "name": "..."}]}],
    ///   "from": {"email": "...", "name": "..."},
    ///   "subject": "...",
    ///   "content": [{"type": "text/plain", "value": "..."}]
    /// }
    /// ```
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let url = format!("{}/v3/mail/send", self.base_url);
        let body = self.request_body(message);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                url,
                serde_json::to_string(&body)?
            );
            return Ok(());
        }

        tracing::debug!("Sending email to {} via SendGrid", message.to_email);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::provider("sendgrid", format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Email to {} accepted by SendGrid ({})", message.to_email, status);
            return Ok(());
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        match status.as_u16() {
            401 | 403 => Err(Error::provider(
                "sendgrid",
                format!("Authentication failed: Invalid API key or insufficient permissions. Status: {status}"),
            )),
            400 | 413 => Err(Error::provider(
                "sendgrid",
                format!("Message rejected: {status} - {error_text}"),
            )),
            429 => Err(Error::provider(
                "sendgrid",
                format!("Rate limit exceeded. Please retry later. Status: {status}"),
            )),
            500..=599 => Err(Error::provider(
                "sendgrid",
                format!("SendGrid server error (transient): {status} - {error_text}"),
            )),
            _ => Err(Error::provider(
                "sendgrid",
                format!("Mail send failed: {status} - {error_text}"),
            )),
        }
    }

    fn notifier_name(&self) -> &'static str {
        "sendgrid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn message() -> EmailMessage {
        EmailMessage::dispatched("x@example.com", "Luis", "1234-abcd")
    }

    fn notifier(base_url: &str) -> SendGridNotifier {
        SendGridNotifier::new("SG.test_key", "dispatch@example.com", "DevTrack", false)
            .unwrap()
            .with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_send_posts_mail_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v3/mail/send")
            .match_header("authorization", "Bearer SG.test_key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "personalizations": [{"to": [{"email": "x@example.com", "name": "Luis"}]}],
                "from": {"email": "dispatch@example.com", "name": "DevTrack"},
                "subject": "Your package was dispatched.",
                "content": [{
                    "type": "text/plain",
                    "value": "Your package with code 1234-abcd was dispatched."
                }]
            })))
            .with_status(202)
            .create_async()
            .await;

        let result = notifier(&server.url()).send(&message()).await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_is_provider_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v3/mail/send")
            .with_status(401)
            .with_body(r#"{"errors":[{"message":"bad key"}]}"#)
            .create_async()
            .await;

        let err = notifier(&server.url()).send(&message()).await.unwrap_err();

        assert!(matches!(err, Error::Provider { ref provider, .. } if provider == "sendgrid"));
        assert!(err.to_string().contains("Authentication failed"));
    }

    #[tokio::test]
    async fn test_server_error_is_reported_as_transient() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v3/mail/send")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let err = notifier(&server.url()).send(&message()).await.unwrap_err();
        assert!(err.to_string().contains("transient"));
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v3/mail/send")
            .expect(0)
            .create_async()
            .await;

        let notifier = SendGridNotifier::new("SG.test_key", "dispatch@example.com", "DevTrack", true)
            .unwrap()
            .with_base_url(server.url());

        assert!(notifier.send(&message()).await.is_ok());
        mock.assert_async().await;
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let result = SendGridNotifier::new("", "dispatch@example.com", "DevTrack", false);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_config() {
        let config = NotifierConfig::SendGrid {
            api_key: "SG.test_key".to_string(),
            sender_email: "dispatch@example.com".to_string(),
            sender_name: "DevTrack".to_string(),
            base_url: Some("http://localhost:9999/".to_string()),
            dry_run: true,
        };

        let notifier = SendGridNotifier::from_config(&config).unwrap();
        assert!(notifier.is_dry_run());
        assert_eq!(notifier.base_url, "http://localhost:9999");

        assert!(SendGridNotifier::from_config(&NotifierConfig::Log).is_err());
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let notifier =
            SendGridNotifier::new("SG.secret_key_12345", "dispatch@example.com", "DevTrack", false)
                .unwrap();

        let debug_str = format!("{:?}", notifier);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("SendGridNotifier"));
    }

    #[test]
    fn test_notifier_name() {
        let notifier = notifier(SENDGRID_API_BASE);
        assert_eq!(notifier.notifier_name(), "sendgrid");
    }
}
