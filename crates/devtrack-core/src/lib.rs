// # devtrack-core
//
// Core library for the DevTrack package-tracking service.
//
// ## Architecture Overview
//
// This library provides the functionality behind the HTTP API:
// - **PackageStore**: Trait for durable package and update storage
// - **Notifier**: Trait for outbound dispatch emails
// - **PackageService**: Validates requests and orchestrates store and notifier
// - **MemoryPackageStore** / **LogNotifier**: In-process implementations
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Injected Collaborators**: Store and notifier are passed in, never global
// 3. **Append-Only History**: Package updates are never rewritten or removed
// 4. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod service;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{DevTrackConfig, NotificationPolicy, NotifierConfig, ServiceConfig, StoreConfig};
pub use error::{Error, Result};
pub use model::{AddPackageInput, AddPackageUpdateInput, Package, PackageUpdate};
pub use notify::LogNotifier;
pub use service::{PackageService, ServiceEvent};
pub use store::MemoryPackageStore;
pub use traits::{EmailMessage, Notifier, PackageStore};
