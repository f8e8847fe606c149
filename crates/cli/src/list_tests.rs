// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::net::UnixListener;

use ward_core::model::{Config, GlobalOptions, ProcessDef};

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

#[tokio::test]
async fn list_prints_the_initial_snapshot_without_error() {
    let primary = Primary::new(&config());
    let dir = tempfile::tempdir().unwrap();
    let listener = UnixListener::bind(dir.path().join("ipc.sock")).unwrap();
    tokio::spawn(crate::ipc::server::accept_loop(listener, Arc::clone(&primary)));

    run(&dir.path().join("ipc.sock")).await.unwrap();
}
