//! Package service
//!
//! The PackageService is responsible for:
//! - Validating client input
//! - Reading and writing packages through the PackageStore
//! - Announcing new packages through the Notifier
//! - Applying the configured notification failure policy
//!
//! ## Architecture
//!
//! ```text
//!                 ┌────────────────┐
//!   request ────▶ │ PackageService │
//!                 └────────────────┘
//!                         │
//!         ┌───────────────┼───────────────┐
//!         │               │               │
//!         ▼               ▼               ▼
//! ┌──────────────┐ ┌─────────────┐ ┌─────────────┐
//! │ PackageStore │ │  Notifier   │ │   Events    │
//! │ (read/write) │ │ (on create) │ │ (optional)  │
//! └──────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! ## Create Flow
//!
//! 1. Validate the title, reject without side effects
//! 2. Build the package with a fresh code and store it
//! 3. Send the dispatch email to the sender
//! 4. Apply the notification policy to the outcome

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{NotificationPolicy, ServiceConfig};
use crate::error::{Error, Result};
use crate::model::{AddPackageInput, AddPackageUpdateInput, Package};
use crate::traits::{EmailMessage, Notifier, PackageStore};

/// Events emitted by the PackageService
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    /// A package was stored
    PackageCreated { code: String },

    /// A status update was appended
    UpdateAppended {
        code: String,
        status: String,
        delivered: bool,
    },

    /// The dispatch email was accepted by the notifier
    NotificationSent { code: String },

    /// The dispatch email failed
    NotificationFailed { code: String, error: String },
}

/// Core package service
///
/// Stateless between calls: every operation goes straight to the store.
/// The store and notifier are injected at construction and shared across
/// requests.
pub struct PackageService {
    /// Package persistence
    store: Arc<dyn PackageStore>,

    /// Dispatch email delivery
    notifier: Arc<dyn Notifier>,

    /// Behavior on notification failure
    notification_policy: NotificationPolicy,

    /// Event sender for external monitoring
    event_tx: Option<mpsc::Sender<ServiceEvent>>,
}

impl std::fmt::Debug for PackageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageService")
            .field("store", &self.store.store_name())
            .field("notifier", &self.notifier.notifier_name())
            .field("notification_policy", &self.notification_policy)
            .finish()
    }
}

impl PackageService {
    /// Create a new package service without an event channel
    pub fn new(
        store: Arc<dyn PackageStore>,
        notifier: Arc<dyn Notifier>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            notification_policy: config.notification_policy,
            event_tx: None,
        }
    }

    /// Create a new package service that reports [`ServiceEvent`]s
    ///
    /// # Returns
    ///
    /// A tuple of (service, event_receiver)
    pub fn with_events(
        store: Arc<dyn PackageStore>,
        notifier: Arc<dyn Notifier>,
        config: ServiceConfig,
    ) -> Result<(Self, mpsc::Receiver<ServiceEvent>)> {
        config.validate_event_channel()?;

        let capacity = config.event_channel_capacity;
        let mut service = Self::new(store, notifier, config);
        let (tx, rx) = mpsc::channel(capacity);
        service.event_tx = Some(tx);
        Ok((service, rx))
    }

    /// List every package
    pub async fn list_packages(&self) -> Result<Vec<Package>> {
        let packages = self.store.get_all().await?;
        debug!("Listed {} package(s)", packages.len());
        Ok(packages)
    }

    /// Get a package by its tracking code
    ///
    /// # Returns
    ///
    /// - `Ok(Package)`: The package with its updates
    /// - `Err(Error::NotFound)`: No package has this code
    pub async fn get_package(&self, code: &str) -> Result<Package> {
        self.store
            .get_by_code(code)
            .await?
            .ok_or_else(|| Error::not_found(format!("package '{code}'")))
    }

    /// Register a package and announce it to the sender
    ///
    /// # Returns
    ///
    /// - `Ok(Package)`: The stored package
    /// - `Err(Error::Validation)`: Title too short, nothing was stored
    /// - `Err(Error::Notification)`: Email failed under
    ///   [`NotificationPolicy::Required`]; the package is stored regardless
    pub async fn create_package(&self, input: AddPackageInput) -> Result<Package> {
        input.validate()?;

        let mut package = Package::new(input.title, input.weight);
        self.store.add(&mut package).await?;

        info!("Created package {} (id {})", package.code, package.id);
        self.emit_event(ServiceEvent::PackageCreated {
            code: package.code.clone(),
        });

        let message = EmailMessage::dispatched(input.sender_email, input.sender_name, &package.code);
        self.notify(&package, &message).await?;

        Ok(package)
    }

    /// Append a status update to a package's history
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Update stored
    /// - `Err(Error::NotFound)`: No package has this code
    pub async fn add_update(&self, code: &str, input: AddPackageUpdateInput) -> Result<()> {
        let mut package = self.get_package(code).await?;

        package.add_update(input.status.clone(), input.delivered);
        self.store.update(&mut package).await?;

        info!(
            "Package {} status: {} (delivered: {})",
            code, input.status, input.delivered
        );
        self.emit_event(ServiceEvent::UpdateAppended {
            code: code.to_string(),
            status: input.status,
            delivered: input.delivered,
        });

        Ok(())
    }

    /// Send the dispatch email and apply the notification policy
    async fn notify(&self, package: &Package, message: &EmailMessage) -> Result<()> {
        match self.notifier.send(message).await {
            Ok(()) => {
                debug!(
                    "Dispatch email for {} sent via {}",
                    package.code,
                    self.notifier.notifier_name()
                );
                self.emit_event(ServiceEvent::NotificationSent {
                    code: package.code.clone(),
                });
                Ok(())
            }
            Err(e) => {
                self.emit_event(ServiceEvent::NotificationFailed {
                    code: package.code.clone(),
                    error: e.to_string(),
                });

                match self.notification_policy {
                    NotificationPolicy::BestEffort => {
                        warn!(
                            "Dispatch email for {} failed via {}: {}",
                            package.code,
                            self.notifier.notifier_name(),
                            e
                        );
                        Ok(())
                    }
                    NotificationPolicy::Required => Err(Error::notification(format!(
                        "package {} was stored but the dispatch email failed: {}",
                        package.code, e
                    ))),
                }
            }
        }
    }

    /// Emit a service event
    fn emit_event(&self, event: ServiceEvent) {
        let Some(tx) = &self.event_tx else {
            return;
        };
        if tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
