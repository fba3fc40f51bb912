//! Minimal embedding example for devtrack-core
//!
//! This example uses PackageService as a library, without the HTTP layer.
//! The application supplies its own notifier and consumes service events.

use devtrack_core::traits::{EmailMessage, Notifier};
use devtrack_core::{
    AddPackageInput, AddPackageUpdateInput, MemoryPackageStore, PackageService, Result,
    ServiceConfig,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

/// Custom notifier that prints instead of sending
struct ConsoleNotifier {
    sent: AtomicUsize,
}

impl ConsoleNotifier {
    fn new() -> Self {
        Self {
            sent: AtomicUsize::new(0),
        }
    }

    fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        println!(
            "[Embedded] To {} <{}>: {}",
            message.to_name, message.to_email, message.body
        );
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "console"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Embedded devtrack-core Example ===\n");

    let store = MemoryPackageStore::new();
    let notifier = Arc::new(ConsoleNotifier::new());

    println!("1. Creating service...");
    let (service, event_rx) = PackageService::with_events(
        Arc::new(store.clone()),
        notifier.clone(),
        ServiceConfig::default(),
    )?;

    let event_listener = tokio::spawn(async move {
        let mut events = ReceiverStream::new(event_rx);
        while let Some(event) = events.next().await {
            println!("[Event] {:?}", event);
        }
        println!("Event listener stopped");
    });

    println!("2. Registering a package...");
    let package = service
        .create_package(AddPackageInput {
            title: "Pacote com jogo de chaves".to_string(),
            weight: 4.0,
            sender_name: "Luis".to_string(),
            sender_email: "luis@example.com".to_string(),
        })
        .await?;
    println!("   code: {}", package.code);

    println!("3. Recording its journey...");
    for (status, delivered) in [("in transit", false), ("delivered", true)] {
        service
            .add_update(
                &package.code,
                AddPackageUpdateInput {
                    status: status.to_string(),
                    delivered,
                },
            )
            .await?;
    }

    let package = service.get_package(&package.code).await?;
    println!("4. History:");
    for update in &package.updates {
        println!("   {} {} (delivered: {})", update.update_date, update.status, update.delivered);
    }

    // Dropping the service closes the event channel
    drop(service);
    let _ = event_listener.await;

    println!("\n=== Embedding Successful ===");
    println!("Packages stored: {}", store.len().await);
    println!("Emails sent: {}", notifier.sent_count());
    println!("Delivered: {}", package.is_delivered());

    Ok(())
}
