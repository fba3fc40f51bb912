// # SendGrid Notifier Real Environment Validation Tool
//
// Sends one dispatch email through the SendGrid notifier to check an API key
// and sender identity before deploying devtrackd.
//
// ## Usage
//
// ```bash
// # Dry-run mode (default - safe)
// DEVTRACK_SENDGRID_API_KEY=SG.xxxxx \
// DEVTRACK_SENDER_EMAIL=dispatch@example.com \
// DEVTRACK_TEST_RECIPIENT=you@example.com \
// cargo run --bin sendgrid_validation
//
// # Live mode (sends a real email!)
// DEVTRACK_MODE=live ... cargo run --bin sendgrid_validation
// ```
//
// ## Environment Variables
//
// Required:
// - `DEVTRACK_SENDGRID_API_KEY`: SendGrid API key
// - `DEVTRACK_SENDER_EMAIL`: Verified sender address
// - `DEVTRACK_TEST_RECIPIENT`: Where the test email goes
//
// Optional:
// - `DEVTRACK_SENDER_NAME`: Sender display name (default: DevTrack)
// - `DEVTRACK_MODE`: "dry-run" or "live" (default: dry-run)

use devtrack_core::traits::{EmailMessage, Notifier};
use devtrack_notify_sendgrid::SendGridNotifier;
use std::env;
use std::process::ExitCode;

fn required(key: &str) -> Option<String> {
    let value = env::var(key).ok().filter(|v| !v.is_empty());
    if value.is_none() {
        tracing::error!("{} environment variable is required", key);
    }
    value
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("=== SendGrid Notifier Real Environment Validation ===");

    let (Some(api_key), Some(sender_email), Some(recipient)) = (
        required("DEVTRACK_SENDGRID_API_KEY"),
        required("DEVTRACK_SENDER_EMAIL"),
        required("DEVTRACK_TEST_RECIPIENT"),
    ) else {
        return ExitCode::from(1);
    };
    let sender_name = env::var("DEVTRACK_SENDER_NAME").unwrap_or_else(|_| "DevTrack".to_string());
    let dry_run = !matches!(env::var("DEVTRACK_MODE").as_deref(), Ok("live"));

    if dry_run {
        tracing::info!("Mode: DRY-RUN (no email will be sent)");
    } else {
        tracing::warn!("Mode: LIVE (a real email will be sent to {})", recipient);
    }

    let notifier = match SendGridNotifier::new(api_key, sender_email, sender_name, dry_run) {
        Ok(notifier) => notifier,
        Err(e) => {
            tracing::error!("Failed to create notifier: {}", e);
            return ExitCode::from(1);
        }
    };
    tracing::info!("Notifier: {:?}", notifier);

    let message = EmailMessage::dispatched(recipient, "DevTrack validation", "validation-0000");
    match notifier.send(&message).await {
        Ok(()) => {
            tracing::info!("✓ Dispatch email accepted");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("✗ Dispatch email failed: {}", e);
            ExitCode::from(2)
        }
    }
}
