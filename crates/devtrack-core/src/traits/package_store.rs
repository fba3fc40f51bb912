// # Package Store Trait
//
// Defines the interface for durable package storage.
//
// ## Implementations
//
// - In-memory: `MemoryPackageStore` (this crate)
// - SQLite: `devtrack-store-sqlite` crate
//
// ## Usage
//
// ```rust,ignore
// use devtrack_core::{Package, PackageStore};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* PackageStore implementation */;
//
//     let mut package = Package::new("Pacote com jogo de chaves", 4.0);
//     store.add(&mut package).await?;
//
//     package.add_update("dispatched", false);
//     store.update(&mut package).await?;
//
//     let found = store.get_by_code(&package.code).await?;
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::Package;

/// Trait for package store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
/// Concurrency control (unique codes, atomic appends) is left to the
/// backing store's own transaction semantics.
///
/// ## Identity
///
/// Stores assign the numeric ids of packages and updates. Entities whose
/// id is [`UNASSIGNED_ID`](crate::model::UNASSIGNED_ID) have not been
/// written yet; `add` and `update` write the assigned ids back into the
/// package they are given.
///
/// ## Append-only history
///
/// `update` persists only the updates that are still unassigned. Persisted
/// updates are never rewritten or removed, even if the caller dropped them
/// from its copy of the package.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Get every stored package with its updates
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Package>)`: All packages ordered by id (empty if none)
    /// - `Err(Error)`: Storage error
    async fn get_all(&self) -> Result<Vec<Package>, crate::Error>;

    /// Look up a package by its tracking code
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Package))`: The package with its updates
    /// - `Ok(None)`: No package has this code
    /// - `Err(Error)`: Storage error
    async fn get_by_code(&self, code: &str) -> Result<Option<Package>, crate::Error>;

    /// Persist a new package
    ///
    /// Assigns the package id (and the ids of any updates it already
    /// carries) and writes them back into `package`.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Successfully stored
    /// - `Err(Error)`: Storage error, including a duplicate code
    async fn add(&self, package: &mut Package) -> Result<(), crate::Error>;

    /// Persist the pending updates of an already stored package
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Pending updates stored and their ids assigned
    /// - `Err(Error::NotFound)`: The package was never stored
    /// - `Err(Error)`: Storage error
    async fn update(&self, package: &mut Package) -> Result<(), crate::Error>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}
