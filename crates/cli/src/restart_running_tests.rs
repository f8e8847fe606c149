// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::net::UnixListener;

use ward_core::model::{Config, GlobalOptions, ProcessDef};

use super::*;
use crate::ipc::protocol::Action;
use crate::primary::Primary;

fn config() -> Config {
    let mut procs = BTreeMap::new();
    procs.insert(
        "a".to_owned(),
        ProcessDef {
            label: String::new(),
            shell: Some("sleep 5".to_owned()),
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
    procs.insert(
        "b".to_owned(),
        ProcessDef {
            label: String::new(),
            shell: Some("sleep 5".to_owned()),
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
async fn restart_running_only_cycles_what_was_running() {
    let primary = Primary::new(&config());
    let dir = tempfile::tempdir().unwrap();
    let listener = UnixListener::bind(dir.path().join("ipc.sock")).unwrap();
    tokio::spawn(crate::ipc::server::accept_loop(listener, Arc::clone(&primary)));

    primary.dispatch(Action::Start, Some("b".to_owned())).await.unwrap();

    run(&dir.path().join("ipc.sock")).await.unwrap();

    assert!(!primary.is_running("a"));
    assert!(primary.is_running("b"));

    primary.dispatch(Action::StopRunning, None).await.unwrap();
}
