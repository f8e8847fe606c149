// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::time::Duration;

use ward_core::model::{Config, GlobalOptions, ProcessDef, Status};

use super::*;

fn def(shell: &str, autostart: bool) -> ProcessDef {
    ProcessDef {
        label: String::new(),
        shell: Some(shell.to_owned()),
        cmd: None,
        cwd: None,
        env: BTreeMap::new(),
        add_path: vec![],
        stop: 15,
        stop_timeout_ms: 300,
        on_kill: vec![],
        autostart,
        categories: vec![],
        description: None,
        docs: None,
    }
}

fn config(procs: &[(&str, ProcessDef)]) -> Config {
    let mut map = BTreeMap::new();
    for (label, d) in procs {
        map.insert((*label).to_owned(), d.clone());
    }
    Config { global: GlobalOptions::default(), procs: map }
}

#[tokio::test]
async fn start_stop_round_trip() {
    let cfg = config(&[("web", def("sleep 2", false))]);
    let primary = Primary::new(&cfg);
    let id = primary.id_for_label("web").unwrap();

    primary.dispatch(Action::Start, Some("web".to_owned())).await.unwrap();
    assert!(primary.controller.is_running(id));

    primary.dispatch(Action::Stop, Some("web".to_owned())).await.unwrap();
    assert!(!primary.controller.is_running(id));
}

#[tokio::test]
async fn start_is_idempotent_when_already_running() {
    let cfg = config(&[("web", def("sleep 2", false))]);
    let primary = Primary::new(&cfg);
    primary.dispatch(Action::Start, Some("web".to_owned())).await.unwrap();
    primary.dispatch(Action::Start, Some("web".to_owned())).await.unwrap();
    primary.dispatch(Action::Stop, Some("web".to_owned())).await.unwrap();
}

#[tokio::test]
async fn stop_on_a_halted_known_label_is_a_noop() {
    let cfg = config(&[("web", def("sleep 2", false))]);
    let primary = Primary::new(&cfg);
    primary.dispatch(Action::Stop, Some("web".to_owned())).await.unwrap();
}

#[tokio::test]
async fn unknown_label_is_not_found() {
    let cfg = config(&[("web", def("sleep 2", false))]);
    let primary = Primary::new(&cfg);
    let err = primary.dispatch(Action::Start, Some("ghost".to_owned())).await.unwrap_err();
    assert!(matches!(err, WardError::NotFound(_)));
}

#[tokio::test]
async fn missing_label_on_a_label_command_is_missing_argument() {
    let cfg = config(&[("web", def("sleep 2", false))]);
    let primary = Primary::new(&cfg);
    let err = primary.dispatch(Action::Start, None).await.unwrap_err();
    assert!(matches!(err, WardError::MissingArgument(_)));
}

#[tokio::test]
async fn unknown_action_is_rejected_without_panicking() {
    let cfg = config(&[("web", def("sleep 2", false))]);
    let primary = Primary::new(&cfg);
    let err = primary.dispatch(Action::Unknown, None).await.unwrap_err();
    assert!(matches!(err, WardError::UnknownAction(_)));
}

#[tokio::test]
async fn switch_updates_selected_and_broadcasts() {
    let cfg = config(&[("web", def("sleep 2", false))]);
    let primary = Primary::new(&cfg);
    let id = primary.id_for_label("web").unwrap();
    let mut rx = primary.subscribe();

    primary.dispatch(Action::Switch, Some("web".to_owned())).await.unwrap();
    let update = rx.recv().await.unwrap();
    assert_eq!(update.state.selected, Some(id));
}

#[tokio::test]
async fn autostart_starts_only_flagged_processes() {
    let cfg = config(&[("web", def("sleep 2", true)), ("db", def("sleep 2", false))]);
    let primary = Primary::new(&cfg);
    primary.autostart().await;

    assert!(primary.controller.is_running(primary.id_for_label("web").unwrap()));
    assert!(!primary.controller.is_running(primary.id_for_label("db").unwrap()));

    primary.dispatch(Action::StopRunning, None).await.unwrap();
}

#[tokio::test]
async fn restart_running_restarts_every_running_process() {
    let cfg = config(&[("web", def("sleep 5", false))]);
    let primary = Primary::new(&cfg);
    let id = primary.id_for_label("web").unwrap();

    primary.dispatch(Action::Start, Some("web".to_owned())).await.unwrap();
    let pid_before = primary.controller.get_pid(id);

    primary.dispatch(Action::RestartRunning, None).await.unwrap();
    let pid_after = primary.controller.get_pid(id);
    assert!(pid_after > 0 && pid_after != pid_before);

    primary.dispatch(Action::StopRunning, None).await.unwrap();
}

#[tokio::test]
async fn natural_exit_is_reported_then_settles_to_halted() {
    let cfg = config(&[("web", def("echo done", false))]);
    let primary = Primary::new(&cfg);
    let id = primary.id_for_label("web").unwrap();
    let mut rx = primary.subscribe();

    primary.dispatch(Action::Start, Some("web".to_owned())).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    let mut saw_exited = false;
    while tokio::time::Instant::now() < deadline {
        let Ok(Ok(update)) = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await else {
            continue;
        };
        let Some(view) = update.process_views.iter().find(|v| v.id == id) else { continue };
        if view.status == Status::Exited {
            saw_exited = true;
        }
        if saw_exited && view.status == Status::Halted {
            break;
        }
    }

    assert!(saw_exited, "expected a transient Exited status update");
    assert!(!primary.controller.is_running(id));
}
