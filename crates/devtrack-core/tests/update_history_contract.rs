//! Contract Test: Append-Only Update History
//!
//! Constraints verified:
//! - N sequential appends produce N updates in call order
//! - Appending to an unknown code is not-found and writes nothing
//! - Updates carry the owning package id and a timestamp

mod common;

use common::*;
use devtrack_core::{Error, ServiceConfig, ServiceEvent};

#[tokio::test]
async fn appends_are_kept_in_call_order() {
    let h = Harness::new(RecordingNotifier::new(), ServiceConfig::default());
    let created = h
        .service
        .create_package(add_input("Pacote com jogo de chaves"))
        .await
        .unwrap();

    let statuses = ["dispatched", "in transit", "out for delivery", "delivered"];
    for (i, status) in statuses.iter().enumerate() {
        h.service
            .add_update(&created.code, update_input(status, i == statuses.len() - 1))
            .await
            .expect("append succeeds");
    }

    let package = h.service.get_package(&created.code).await.unwrap();
    let stored: Vec<_> = package.updates.iter().map(|u| u.status.as_str()).collect();
    assert_eq!(stored, statuses);
    assert!(package.updates.iter().all(|u| u.package_id == created.id));
    assert!(
        package
            .updates
            .windows(2)
            .all(|w| w[0].id < w[1].id && w[0].update_date <= w[1].update_date)
    );
    assert!(package.is_delivered());
    assert_eq!(h.store.update_call_count(), statuses.len());
}

#[tokio::test]
async fn delivered_update_is_visible_on_lookup() {
    let mut h = Harness::new(RecordingNotifier::new(), ServiceConfig::default());
    let created = h
        .service
        .create_package(add_input("Pacote com jogo de chaves"))
        .await
        .unwrap();
    h.drain_events();

    h.service
        .add_update(&created.code, update_input("delivered", true))
        .await
        .unwrap();

    let package = h.service.get_package(&created.code).await.unwrap();
    assert_eq!(package.updates.len(), 1);
    assert_eq!(package.updates[0].status, "delivered");
    assert!(package.updates[0].delivered);

    assert_eq!(
        h.drain_events(),
        vec![ServiceEvent::UpdateAppended {
            code: created.code,
            status: "delivered".to_string(),
            delivered: true,
        }]
    );
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let h = Harness::new(RecordingNotifier::new(), ServiceConfig::default());

    let get = h.service.get_package("nonexistent").await;
    let append = h
        .service
        .add_update("nonexistent", update_input("delivered", true))
        .await;

    assert!(matches!(get, Err(Error::NotFound(_))));
    assert!(matches!(append, Err(Error::NotFound(_))));
    assert_eq!(h.store.update_call_count(), 0);
}

#[tokio::test]
async fn failed_append_leaves_history_unchanged() {
    let h = Harness::new(RecordingNotifier::new(), ServiceConfig::default());
    let created = h
        .service
        .create_package(add_input("Pacote com jogo de chaves"))
        .await
        .unwrap();
    h.service
        .add_update(&created.code, update_input("dispatched", false))
        .await
        .unwrap();

    h.store.fail_writes();
    let result = h
        .service
        .add_update(&created.code, update_input("delivered", true))
        .await;

    assert!(matches!(result, Err(Error::Storage(_))));
    let package = h.service.get_package(&created.code).await.unwrap();
    assert_eq!(package.updates.len(), 1);
    assert_eq!(package.updates[0].status, "dispatched");
}
