// # Memory Package Store
//
// In-memory implementation of PackageStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing, demos, and throwaway deployments.
//
// ## Crash Behavior
//
// - All packages are lost on restart/crash
// - Ids restart from 1

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::model::Package;
use crate::traits::PackageStore;

/// In-memory package store implementation
///
/// Packages are kept in insertion order behind a RwLock, together with the
/// id counters. Cloning the store shares the same underlying data.
///
/// # Example
///
/// ```rust,no_run
/// use devtrack_core::store::MemoryPackageStore;
/// use devtrack_core::traits::PackageStore;
/// use devtrack_core::Package;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryPackageStore::new();
///
///     let mut package = Package::new("Pacote com jogo de chaves", 4.0);
///     store.add(&mut package).await?;
///
///     let found = store.get_by_code(&package.code).await?;
///     assert_eq!(found, Some(package));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryPackageStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    packages: Vec<Package>,
    last_package_id: i64,
    last_update_id: i64,
}

impl MemoryState {
    fn assign_pending_update_ids(&mut self, package: &mut Package) {
        for update in package.updates.iter_mut().filter(|u| !u.is_persisted()) {
            self.last_update_id += 1;
            update.id = self.last_update_id;
            update.package_id = package.id;
        }
    }
}

impl MemoryPackageStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of packages in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.packages.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.packages.is_empty()
    }
}

#[async_trait]
impl PackageStore for MemoryPackageStore {
    async fn get_all(&self) -> Result<Vec<Package>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.packages.clone())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Package>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.packages.iter().find(|p| p.code == code).cloned())
    }

    async fn add(&self, package: &mut Package) -> Result<(), Error> {
        let mut guard = self.inner.write().await;

        if package.is_persisted() {
            return Err(Error::storage(format!(
                "package {} is already stored",
                package.id
            )));
        }
        if guard.packages.iter().any(|p| p.code == package.code) {
            return Err(Error::storage(format!(
                "duplicate package code: {}",
                package.code
            )));
        }

        guard.last_package_id += 1;
        package.id = guard.last_package_id;
        guard.assign_pending_update_ids(package);
        guard.packages.push(package.clone());

        tracing::debug!("Stored package {} ({})", package.id, package.code);
        Ok(())
    }

    async fn update(&self, package: &mut Package) -> Result<(), Error> {
        let mut guard = self.inner.write().await;

        let Some(index) = guard
            .packages
            .iter()
            .position(|p| package.is_persisted() && p.id == package.id)
        else {
            return Err(Error::not_found(format!(
                "package {} is not stored",
                package.code
            )));
        };

        guard.assign_pending_update_ids(package);

        let stored = &mut guard.packages[index];
        let known = stored.updates.len();
        let appended: Vec<_> = package
            .updates
            .iter()
            .filter(|u| !stored.updates.iter().any(|s| s.id == u.id))
            .cloned()
            .collect();
        stored.updates.extend(appended);

        tracing::debug!(
            "Appended {} update(s) to package {}",
            stored.updates.len() - known,
            stored.code
        );
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}
