//! Configuration types for the DevTrack system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main DevTrack configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevTrackConfig {
    /// Package store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Notifier configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Optional service settings
    #[serde(default)]
    pub service: ServiceConfig,
}

impl DevTrackConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()?;
        self.notifier.validate()?;
        Ok(())
    }
}

/// Package store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// SQLite database
    Sqlite {
        /// Database URL (e.g., "sqlite://devtrack.db" or "sqlite::memory:")
        url: String,
    },

    /// In-memory store (not persistent)
    Memory,
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Sqlite { url } => {
                if !url.starts_with("sqlite:") {
                    return Err(crate::Error::config(format!(
                        "SQLite database URL must start with 'sqlite:'. Got: {url}"
                    )));
                }
                Ok(())
            }
            StoreConfig::Memory => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Sqlite { .. } => "sqlite",
            StoreConfig::Memory => "memory",
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Sqlite {
            url: default_database_url(),
        }
    }
}

/// Notifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// SendGrid v3 mail API
    #[serde(rename = "sendgrid")]
    SendGrid {
        /// SendGrid API key
        api_key: String,
        /// Verified sender address
        sender_email: String,
        /// Sender display name
        sender_name: String,
        /// API base URL override (tests, proxies)
        #[serde(default)]
        base_url: Option<String>,
        /// Log the payload instead of sending it
        #[serde(default)]
        dry_run: bool,
    },

    /// Log messages instead of sending them
    #[default]
    Log,
}

impl NotifierConfig {
    /// Validate the notifier configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            NotifierConfig::SendGrid {
                api_key,
                sender_email,
                ..
            } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("SendGrid API key cannot be empty"));
                }
                if !sender_email.contains('@') {
                    return Err(crate::Error::config(format!(
                        "Sender email is not an email address: '{sender_email}'"
                    )));
                }
                Ok(())
            }
            NotifierConfig::Log => Ok(()),
        }
    }

    /// Get the notifier type name
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::SendGrid { .. } => "sendgrid",
            NotifierConfig::Log => "log",
        }
    }
}

/// What package creation does when the dispatch email fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPolicy {
    /// Log the failure and still report the package as created
    #[default]
    BestEffort,
    /// Report the failure to the caller; the package stays stored
    Required,
}

impl std::str::FromStr for NotificationPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            "required" => Ok(Self::Required),
            other => Err(crate::Error::config(format!(
                "Unknown notification policy '{other}'. Valid: best_effort, required"
            ))),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Behavior on notification failure
    #[serde(default)]
    pub notification_policy: NotificationPolicy,

    /// Capacity of the service event channel
    ///
    /// Only used when the service is built with events. When full, new
    /// events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl ServiceConfig {
    /// Validate the settings of the optional event channel
    pub fn validate_event_channel(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            notification_policy: NotificationPolicy::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://devtrack.db".to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}
