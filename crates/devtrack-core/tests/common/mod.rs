//! Test doubles and common utilities for service contract tests
//!
//! This module provides minimal test doubles that count calls and inject
//! failures without implementing real storage or delivery.

#![allow(dead_code)]

use devtrack_core::error::{Error, Result};
use devtrack_core::traits::{EmailMessage, Notifier, PackageStore};
use devtrack_core::{MemoryPackageStore, Package, PackageService, ServiceConfig, ServiceEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// A PackageStore that delegates to memory and counts writes
pub struct CountingStore {
    inner: MemoryPackageStore,
    add_call_count: Arc<AtomicUsize>,
    update_call_count: Arc<AtomicUsize>,
    /// When set, every write fails with a storage error
    fail_writes: Arc<AtomicBool>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryPackageStore::new(),
            add_call_count: Arc::new(AtomicUsize::new(0)),
            update_call_count: Arc::new(AtomicUsize::new(0)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the number of times add() was called
    pub fn add_call_count(&self) -> usize {
        self.add_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times update() was called
    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    /// Make every following write fail
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Number of stored packages
    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::storage("connection lost"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PackageStore for CountingStore {
    async fn get_all(&self) -> Result<Vec<Package>> {
        self.inner.get_all().await
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Package>> {
        self.inner.get_by_code(code).await
    }

    async fn add(&self, package: &mut Package) -> Result<()> {
        self.add_call_count.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        self.inner.add(package).await
    }

    async fn update(&self, package: &mut Package) -> Result<()> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        self.inner.update(package).await
    }

    fn store_name(&self) -> &'static str {
        "counting"
    }
}

/// A Notifier that records messages and can be told to fail
pub struct RecordingNotifier {
    sent: Arc<std::sync::Mutex<Vec<EmailMessage>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(std::sync::Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// A notifier whose provider rejects every message
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Messages handed to send(), including failed ones
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(Error::provider("recording", "provider unavailable"));
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

/// Service wired to shared test doubles
pub struct Harness {
    pub service: PackageService,
    pub store: Arc<CountingStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub events: mpsc::Receiver<ServiceEvent>,
}

impl Harness {
    pub fn new(notifier: RecordingNotifier, config: ServiceConfig) -> Self {
        let store = Arc::new(CountingStore::new());
        let notifier = Arc::new(notifier);
        let (service, events) =
            PackageService::with_events(store.clone(), notifier.clone(), config)
                .expect("service construction succeeds");

        Self {
            service,
            store,
            notifier,
            events,
        }
    }

    /// Drain every event emitted so far
    pub fn drain_events(&mut self) -> Vec<ServiceEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Helper to build a creation request
pub fn add_input(title: &str) -> devtrack_core::AddPackageInput {
    devtrack_core::AddPackageInput {
        title: title.to_string(),
        weight: 4.0,
        sender_name: "Luis".to_string(),
        sender_email: "x@example.com".to_string(),
    }
}

/// Helper to build an update request
pub fn update_input(status: &str, delivered: bool) -> devtrack_core::AddPackageUpdateInput {
    devtrack_core::AddPackageUpdateInput {
        status: status.to_string(),
        delivered,
    }
}
