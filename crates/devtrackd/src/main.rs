// # devtrackd - DevTrack HTTP daemon
//
// Thin integration layer: all package logic lives in devtrack-core and all
// HTTP mapping in devtrack-api. The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the package store and notifier
// 4. Serving the API until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Server
// - `DEVTRACK_BIND_ADDR`: Listen address (default `0.0.0.0:8080`)
// - `DEVTRACK_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
//
// ### Package Store
// - `DEVTRACK_STORE_TYPE`: sqlite or memory (default `sqlite`)
// - `DEVTRACK_DATABASE_URL`: SQLite URL (default `sqlite://devtrack.db`)
//
// ### Notifier
// - `DEVTRACK_NOTIFIER_TYPE`: sendgrid or log (default `sendgrid`)
// - `DEVTRACK_SENDGRID_API_KEY`: SendGrid API key
// - `DEVTRACK_SENDER_EMAIL`: Verified sender address
// - `DEVTRACK_SENDER_NAME`: Sender display name (default `DevTrack`)
// - `DEVTRACK_NOTIFICATION_POLICY`: best_effort or required (default `best_effort`)
// - `DEVTRACK_MODE`: set to `dry-run` to log emails instead of sending them
//
// ## Example
//
// ```bash
// export DEVTRACK_DATABASE_URL=sqlite:///var/lib/devtrack/devtrack.db
// export DEVTRACK_SENDGRID_API_KEY=SG.xxxxx
// export DEVTRACK_SENDER_EMAIL=dispatch@example.com
//
// devtrackd
// ```

use anyhow::{Context, Result};
use devtrack_core::traits::{Notifier, PackageStore};
use devtrack_core::{
    DevTrackConfig, LogNotifier, MemoryPackageStore, NotificationPolicy, NotifierConfig,
    PackageService, ServiceConfig, StoreConfig,
};
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DevTrackExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DevTrackExitCode> for ExitCode {
    fn from(code: DevTrackExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration, as read from the environment
#[derive(Debug)]
struct Config {
    bind_addr: String,
    store_type: String,
    database_url: String,
    notifier_type: String,
    sendgrid_api_key: Option<String>,
    sender_email: Option<String>,
    sender_name: String,
    notification_policy: String,
    dry_run: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind_addr: var("DEVTRACK_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            store_type: var("DEVTRACK_STORE_TYPE").unwrap_or_else(|| "sqlite".to_string()),
            database_url: var("DEVTRACK_DATABASE_URL")
                .unwrap_or_else(|| "sqlite://devtrack.db".to_string()),
            notifier_type: var("DEVTRACK_NOTIFIER_TYPE").unwrap_or_else(|| "sendgrid".to_string()),
            sendgrid_api_key: var("DEVTRACK_SENDGRID_API_KEY"),
            sender_email: var("DEVTRACK_SENDER_EMAIL"),
            sender_name: var("DEVTRACK_SENDER_NAME").unwrap_or_else(|| "DevTrack".to_string()),
            notification_policy: var("DEVTRACK_NOTIFICATION_POLICY")
                .unwrap_or_else(|| "best_effort".to_string()),
            dry_run: var("DEVTRACK_MODE").is_some_and(|m| m.eq_ignore_ascii_case("dry-run")),
            log_level: var("DEVTRACK_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        self.log_level()?;
        self.to_devtrack_config()?.validate()?;
        Ok(())
    }

    fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind_addr.parse().with_context(|| {
            format!(
                "DEVTRACK_BIND_ADDR '{}' is not a socket address (e.g. 0.0.0.0:8080)",
                self.bind_addr
            )
        })
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DEVTRACK_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Translate the environment into the core configuration types
    fn to_devtrack_config(&self) -> Result<DevTrackConfig> {
        let store = match self.store_type.as_str() {
            "sqlite" => StoreConfig::Sqlite {
                url: self.database_url.clone(),
            },
            "memory" => StoreConfig::Memory,
            other => anyhow::bail!(
                "DEVTRACK_STORE_TYPE '{}' is not supported. Supported types: sqlite, memory",
                other
            ),
        };

        let notifier = match self.notifier_type.as_str() {
            "sendgrid" => NotifierConfig::SendGrid {
                api_key: self.sendgrid_api_key.clone().with_context(|| {
                    "DEVTRACK_SENDGRID_API_KEY is required when DEVTRACK_NOTIFIER_TYPE=sendgrid. \
                    Set it via: export DEVTRACK_SENDGRID_API_KEY=your_key"
                })?,
                sender_email: self.sender_email.clone().with_context(|| {
                    "DEVTRACK_SENDER_EMAIL is required when DEVTRACK_NOTIFIER_TYPE=sendgrid"
                })?,
                sender_name: self.sender_name.clone(),
                base_url: None,
                dry_run: self.dry_run,
            },
            "log" => NotifierConfig::Log,
            other => anyhow::bail!(
                "DEVTRACK_NOTIFIER_TYPE '{}' is not supported. Supported types: sendgrid, log",
                other
            ),
        };

        let notification_policy: NotificationPolicy = self.notification_policy.parse()?;

        Ok(DevTrackConfig {
            store,
            notifier,
            service: ServiceConfig {
                notification_policy,
                ..ServiceConfig::default()
            },
        })
    }
}

fn main() -> ExitCode {
    let config = Config::from_env();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DevTrackExitCode::ConfigError.into();
    }

    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DevTrackExitCode::ConfigError.into();
    }

    info!("Starting devtrackd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DevTrackExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            DevTrackExitCode::RuntimeError
        } else {
            DevTrackExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let devtrack_config = config.to_devtrack_config()?;
    let bind_addr = config.bind_addr()?;

    info!("Store type: {}", devtrack_config.store.type_name());
    info!("Notifier type: {}", devtrack_config.notifier.type_name());
    info!(
        "Notification policy: {:?}",
        devtrack_config.service.notification_policy
    );

    let store = build_store(&devtrack_config.store).await?;
    let notifier = build_notifier(&devtrack_config.notifier)?;
    let service = PackageService::new(store, notifier, devtrack_config.service);
    let app = devtrack_api::build_router(Arc::new(service));

    let shutdown = shutdown_signal()?;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!("DevTrack API listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    info!("Shutting down daemon");
    Ok(())
}

async fn build_store(config: &StoreConfig) -> Result<Arc<dyn PackageStore>> {
    match config {
        #[cfg(feature = "sqlite")]
        StoreConfig::Sqlite { url } => {
            let store = devtrack_store_sqlite::SqlitePackageStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        StoreConfig::Sqlite { .. } => {
            anyhow::bail!("devtrackd was built without the 'sqlite' feature")
        }
        StoreConfig::Memory => {
            warn!("Using the in-memory store: packages are lost on shutdown");
            Ok(Arc::new(MemoryPackageStore::new()))
        }
    }
}

fn build_notifier(config: &NotifierConfig) -> Result<Arc<dyn Notifier>> {
    match config {
        #[cfg(feature = "sendgrid")]
        NotifierConfig::SendGrid { .. } => {
            let notifier = devtrack_notify_sendgrid::SendGridNotifier::from_config(config)?;
            Ok(Arc::new(notifier))
        }
        #[cfg(not(feature = "sendgrid"))]
        NotifierConfig::SendGrid { .. } => {
            anyhow::bail!("devtrackd was built without the 'sendgrid' feature")
        }
        NotifierConfig::Log => Ok(Arc::new(LogNotifier::new())),
    }
}

/// Future that resolves on SIGTERM or SIGINT
///
/// Handlers are installed before the server starts so a setup failure is
/// reported as a startup error.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Future that resolves on CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: SIGINT"),
            Err(e) => error!("Failed to wait for CTRL-C: {}", e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_require_sendgrid_credentials() {
        let err = config(&[]).validate().unwrap_err();
        assert!(err.to_string().contains("DEVTRACK_SENDGRID_API_KEY"));
    }

    #[test]
    fn memory_store_with_log_notifier() {
        let config = config(&[
            ("DEVTRACK_STORE_TYPE", "memory"),
            ("DEVTRACK_NOTIFIER_TYPE", "log"),
        ]);
        assert!(config.validate().is_ok());

        let devtrack = config.to_devtrack_config().unwrap();
        assert_eq!(devtrack.store.type_name(), "memory");
        assert_eq!(devtrack.notifier.type_name(), "log");
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn sendgrid_settings_are_mapped() {
        let config = config(&[
            ("DEVTRACK_SENDGRID_API_KEY", "SG.key"),
            ("DEVTRACK_SENDER_EMAIL", "dispatch@example.com"),
            ("DEVTRACK_NOTIFICATION_POLICY", "required"),
            ("DEVTRACK_MODE", "dry-run"),
        ]);
        assert!(config.validate().is_ok());

        let devtrack = config.to_devtrack_config().unwrap();
        assert_eq!(
            devtrack.service.notification_policy,
            NotificationPolicy::Required
        );
        match devtrack.notifier {
            NotifierConfig::SendGrid {
                sender_name,
                dry_run,
                ..
            } => {
                assert_eq!(sender_name, "DevTrack");
                assert!(dry_run);
            }
            other => panic!("unexpected notifier config: {other:?}"),
        }
    }

    #[test]
    fn invalid_values_are_rejected() {
        let base = [
            ("DEVTRACK_STORE_TYPE", "memory"),
            ("DEVTRACK_NOTIFIER_TYPE", "log"),
        ];

        for (key, value) in [
            ("DEVTRACK_BIND_ADDR", "localhost"),
            ("DEVTRACK_LOG_LEVEL", "verbose"),
            ("DEVTRACK_STORE_TYPE", "postgres"),
            ("DEVTRACK_NOTIFICATION_POLICY", "sometimes"),
        ] {
            let mut vars = base.to_vec();
            vars.push((key, value));
            assert!(config(&vars).validate().is_err(), "{key}={value} accepted");
        }
    }
}
