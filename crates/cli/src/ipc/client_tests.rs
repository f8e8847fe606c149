// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UnixListener;

use ward_core::model::{Config, GlobalOptions, ProcessDef, Status};

use super::*;
use crate::primary::Primary;

fn config() -> Config {
    let mut procs = BTreeMap::new();
    procs.insert(
        "web".to_owned(),
        ProcessDef {
            label: String::new(),
            shell: Some("sleep 2".to_owned()),
            cmd: None,
            cwd: None,
            env: BTreeMap::new(),
            add_path: vec![],
            stop: 15,
            stop_timeout_ms: 300,
            on_kill: vec![],
            autostart: false,
            categories: vec![],
            description: None,
            docs: None,
        },
    );
    Config { global: GlobalOptions::default(), procs }
}

async fn serving_socket(primary: &Arc<Primary>) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let listener = UnixListener::bind(dir.path().join("ipc.sock")).unwrap();
    tokio::spawn(crate::ipc::server::accept_loop(listener, Arc::clone(primary)));
    dir
}

#[tokio::test]
async fn connect_yields_an_initial_snapshot_on_the_updates_channel() {
    let primary = Primary::new(&config());
    let dir = serving_socket(&primary).await;

    let (_client, mut updates) = Client::connect(&dir.path().join("ipc.sock")).await.unwrap();
    let update = tokio::time::timeout(Duration::from_secs(1), updates.recv()).await.unwrap().unwrap();
    assert_eq!(update.process_views.len(), 1);
}

#[tokio::test]
async fn start_then_stop_round_trips_through_the_typed_api() {
    let primary = Primary::new(&config());
    let dir = serving_socket(&primary).await;

    let (client, _updates) = Client::connect(&dir.path().join("ipc.sock")).await.unwrap();
    client.start_process("web").await.unwrap();
    client.stop_process("web").await.unwrap();
}

#[tokio::test]
async fn unknown_label_surfaces_as_a_remote_error() {
    let primary = Primary::new(&config());
    let dir = serving_socket(&primary).await;

    let (client, _updates) = Client::connect(&dir.path().join("ipc.sock")).await.unwrap();
    let err = client.start_process("ghost").await.unwrap_err();
    assert!(matches!(err, CliError::Remote(_)));
}

#[tokio::test]
async fn a_mutation_is_observed_on_the_updates_channel() {
    let primary = Primary::new(&config());
    let dir = serving_socket(&primary).await;

    let (client, mut updates) = Client::connect(&dir.path().join("ipc.sock")).await.unwrap();
    let _initial = updates.recv().await.unwrap();

    client.start_process("web").await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    let mut saw_running = false;
    while tokio::time::Instant::now() < deadline {
        let next = tokio::time::timeout(Duration::from_millis(300), updates.recv()).await;
        let Ok(Some(update)) = next else { continue };
        if update.process_views.iter().any(|v| v.status == Status::Running) {
            saw_running = true;
            break;
        }
    }
    assert!(saw_running);

    client.stop_running().await.unwrap();
}

#[tokio::test]
async fn connecting_to_a_missing_socket_is_not_reachable() {
    let dir = tempfile::tempdir().unwrap();
    let err = Client::connect(&dir.path().join("absent.sock")).await.unwrap_err();
    assert!(matches!(err, CliError::NotReachable(_)));
}
