//! Package tracking data model
//!
//! A [`Package`] is identified internally by a store-assigned numeric `id`
//! and externally by an opaque `code`. Its [`PackageUpdate`] history only
//! ever grows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id carried by entities the store has not persisted yet
pub const UNASSIGNED_ID: i64 = 0;

/// Minimum number of characters accepted for a package title
pub const MIN_TITLE_LENGTH: usize = 10;

/// A tracked package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Store-assigned identity
    pub id: i64,
    /// Public tracking code
    pub code: String,
    /// Package title
    pub title: String,
    /// Package weight
    pub weight: f64,
    /// Status history, oldest first
    pub updates: Vec<PackageUpdate>,
}

impl Package {
    /// Create a new, unpersisted package with a freshly generated code
    pub fn new(title: impl Into<String>, weight: f64) -> Self {
        Self {
            id: UNASSIGNED_ID,
            code: generate_code(),
            title: title.into(),
            weight,
            updates: Vec::new(),
        }
    }

    /// Append a status update to the history
    ///
    /// The update is unpersisted until the package is handed to
    /// [`PackageStore::update`](crate::traits::PackageStore::update).
    pub fn add_update(&mut self, status: impl Into<String>, delivered: bool) {
        self.updates
            .push(PackageUpdate::new(self.id, status, delivered));
    }

    /// Whether the store has assigned an id to this package
    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ID
    }

    /// The most recent status update, if any
    pub fn latest_update(&self) -> Option<&PackageUpdate> {
        self.updates.last()
    }

    /// Whether the latest update marks the package as delivered
    pub fn is_delivered(&self) -> bool {
        self.latest_update().is_some_and(|update| update.delivered)
    }

    /// Updates that still need to be written to the store
    pub fn pending_updates(&self) -> impl Iterator<Item = &PackageUpdate> {
        self.updates.iter().filter(|update| !update.is_persisted())
    }
}

/// One timestamped entry in a package's status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageUpdate {
    /// Store-assigned identity
    pub id: i64,
    /// Owning package id
    pub package_id: i64,
    /// Free-form status text
    pub status: String,
    /// Terminal delivery flag
    pub delivered: bool,
    /// Creation timestamp
    pub update_date: DateTime<Utc>,
}

impl PackageUpdate {
    fn new(package_id: i64, status: impl Into<String>, delivered: bool) -> Self {
        Self {
            id: UNASSIGNED_ID,
            package_id,
            status: status.into(),
            delivered,
            update_date: Utc::now(),
        }
    }

    /// Whether the store has assigned an id to this update
    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ID
    }
}

/// Request body for registering a package
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPackageInput {
    pub title: String,
    pub weight: f64,
    pub sender_name: String,
    pub sender_email: String,
}

impl AddPackageInput {
    /// Check the input before anything is persisted
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.chars().count() < MIN_TITLE_LENGTH {
            return Err(crate::Error::validation(format!(
                "Title length must be at least {MIN_TITLE_LENGTH} characters long."
            )));
        }
        Ok(())
    }
}

/// Request body for appending a status update
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPackageUpdateInput {
    pub status: String,
    #[serde(default)]
    pub delivered: bool,
}

fn generate_code() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> AddPackageInput {
        AddPackageInput {
            title: title.to_string(),
            weight: 1.0,
            sender_name: "Luis".to_string(),
            sender_email: "x@example.com".to_string(),
        }
    }

    #[test]
    fn new_package_is_unpersisted_with_fresh_code() {
        let a = Package::new("Pacote com jogo de chaves", 4.0);
        let b = Package::new("Pacote com jogo de chaves", 4.0);

        assert!(!a.is_persisted());
        assert!(a.updates.is_empty());
        assert_ne!(a.code, b.code);
        assert!(Uuid::parse_str(&a.code).is_ok());
    }

    #[test]
    fn add_update_links_to_package_and_stays_pending() {
        let mut package = Package::new("Pacote com jogo de chaves", 4.0);
        package.id = 7;

        package.add_update("dispatched", false);
        package.add_update("delivered", true);

        assert_eq!(package.updates.len(), 2);
        assert!(package.updates.iter().all(|u| u.package_id == 7));
        assert_eq!(package.pending_updates().count(), 2);
        assert_eq!(package.latest_update().map(|u| u.status.as_str()), Some("delivered"));
        assert!(package.is_delivered());
    }

    #[test]
    fn title_length_counts_characters() {
        assert!(input("short").validate().is_err());
        assert!(input("123456789").validate().is_err());
        assert!(input("1234567890").validate().is_ok());
        // 10 characters, more than 10 bytes
        assert!(input("ááááááááéé").validate().is_ok());
    }

    #[test]
    fn json_shape_uses_camel_case() {
        let mut package = Package::new("Pacote com jogo de chaves", 4.0);
        package.id = 1;
        package.add_update("delivered", true);

        let json = serde_json::to_value(&package).unwrap();
        assert_eq!(json["title"], "Pacote com jogo de chaves");
        assert_eq!(json["updates"][0]["packageId"], 1);
        assert_eq!(json["updates"][0]["delivered"], true);
        assert!(json["updates"][0]["updateDate"].is_string());
    }

    #[test]
    fn update_input_defaults_delivered_to_false() {
        let input: AddPackageUpdateInput =
            serde_json::from_str(r#"{"status":"in transit"}"#).unwrap();
        assert!(!input.delivered);
    }
}
