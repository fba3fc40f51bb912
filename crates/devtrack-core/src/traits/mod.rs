//! Core traits for the DevTrack system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`PackageStore`]: Durable storage of packages and their update history
//! - [`Notifier`]: Outbound email delivery through an external provider

pub mod notifier;
pub mod package_store;

pub use notifier::{EmailMessage, Notifier};
pub use package_store::PackageStore;
