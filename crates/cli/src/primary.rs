// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The primary server: the authority that owns domain state and the
//! process controller, and implements the command table (spec.md §4.5).

use std::collections::{BTreeMap, HashMap};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::{UnixListener, UnixStream};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tracing::{info, warn};
use ward_core::controller::ProcessController;
use ward_core::instance::Process;
use ward_core::model::{
    self, AppState, Config, ProcessId, ProcessRecord, ProcessRecordView, ProcessView, StateUpdate, Status,
};
use ward_core::pty::spawn::{DEFAULT_COLS, DEFAULT_ROWS};
use ward_core::redact;
use ward_core::{Result as CoreResult, WardError};

use crate::error::{CliError, Result};
use crate::ipc::protocol::{Action, Envelope};
use crate::ipc::server;

/// Depth of the state-update broadcast channel. A slow subscriber can fall
/// behind by this many updates before it starts missing them (handled as
/// `Lagged` in the connection loop, not as an error for other clients).
const BROADCAST_CAPACITY: usize = 64;

/// How long the startup probe waits for a stale primary to answer.
const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// How long shutdown waits for every running process to stop before giving
/// up and removing the socket anyway.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Primary {
    controller: ProcessController,
    records: BTreeMap<ProcessId, ProcessRecord>,
    by_label: HashMap<String, ProcessId>,
    selected: Mutex<Option<ProcessId>>,
    broadcast_tx: broadcast::Sender<StateUpdate>,
    cols: u16,
    rows: u16,
}

impl Primary {
    pub fn new(config: &Config) -> Arc<Self> {
        let assigned = model::assign_records(config);
        let by_label = assigned.iter().map(|r| (r.label.clone(), r.id)).collect();
        let records = assigned.into_iter().map(|r| (r.id, r)).collect();
        let (broadcast_tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);

        Arc::new(Self {
            controller: ProcessController::new(config.global.fallback_shell.clone()),
            records,
            by_label,
            selected: Mutex::new(None),
            broadcast_tx,
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateUpdate> {
        self.broadcast_tx.subscribe()
    }

    pub fn snapshot_envelope(&self) -> Envelope {
        let update = self.state_update(None);
        let redacted = redact::redact_state_update(&update);
        Envelope::State { state: redacted.state, views: redacted.process_views }
    }

    /// Whether the named process is currently running. Exposed for the thin
    /// CLI command wrappers' tests, which only see the IPC surface otherwise.
    #[cfg(test)]
    pub(crate) fn is_running(&self, label: &str) -> bool {
        self.by_label.get(label).map(|&id| self.controller.is_running(id)).unwrap_or(false)
    }

    /// Dispatch one command (spec.md §4.5's table). Publishes a broadcast
    /// after every mutation, before returning, so a response is never sent
    /// ahead of the broadcast that describes the same change.
    pub async fn dispatch(self: &Arc<Self>, action: Action, label: Option<String>) -> CoreResult<()> {
        if matches!(action, Action::Unknown) {
            return Err(WardError::UnknownAction(label.unwrap_or_default()));
        }
        if action.requires_label() && label.as_deref().map(str::is_empty).unwrap_or(true) {
            return Err(WardError::MissingArgument("label".to_owned()));
        }

        match action {
            Action::List => Ok(()),
            Action::Switch => {
                let id = self.id_for_label(label.as_deref().unwrap_or_default())?;
                *self.selected.lock() = Some(id);
                self.publish(None);
                Ok(())
            }
            Action::Start => {
                self.start_by_label(label.as_deref().unwrap_or_default()).await?;
                self.publish(None);
                Ok(())
            }
            Action::Stop => {
                let result = self.stop_by_label(label.as_deref().unwrap_or_default()).await;
                self.publish(None);
                result
            }
            Action::Restart => {
                let target = label.as_deref().unwrap_or_default();
                let _ = self.stop_by_label(target).await;
                let result = self.start_by_label(target).await;
                self.publish(None);
                result
            }
            Action::StopRunning => {
                let result = self.stop_running().await;
                self.publish(None);
                result
            }
            Action::RestartRunning => {
                let result = self.restart_running().await;
                self.publish(None);
                result
            }
            Action::Unknown => unreachable!("handled above"),
        }
    }

    pub async fn autostart(self: &Arc<Self>) {
        for record in self.records.values() {
            if record.config.autostart {
                if let Err(e) = self.start_by_label(&record.label).await {
                    warn!(label = %record.label, error = %e, "autostart failed");
                }
            }
        }
        self.publish(None);
    }

    async fn start_by_label(self: &Arc<Self>, label: &str) -> CoreResult<()> {
        let id = self.id_for_label(label)?;
        if self.controller.is_running(id) {
            return Ok(());
        }
        let record = self.record(id)?.clone();
        let process =
            self.controller.start_process(id, &record.label, &record.config, self.cols, self.rows).await?;
        self.spawn_exit_watcher(id, process);
        Ok(())
    }

    async fn stop_by_label(&self, label: &str) -> CoreResult<()> {
        let id = self.id_for_label(label)?;
        if !self.controller.is_running(id) {
            return Ok(());
        }
        self.controller.stop_process(id).await
    }

    async fn stop_running(&self) -> CoreResult<()> {
        let mut first_err = None;
        for id in self.controller.get_all_process_ids() {
            if let Err(e) = self.controller.stop_process(id).await {
                warn!(id, error = %e, "stop_running: failed to stop one process");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    async fn restart_running(self: &Arc<Self>) -> CoreResult<()> {
        let running = self.controller.get_all_process_ids();
        for &id in &running {
            let _ = self.controller.stop_process(id).await;
        }
        let mut first_err = None;
        for id in running {
            let record = match self.record(id) {
                Ok(r) => r.clone(),
                Err(_) => continue,
            };
            let result = self
                .controller
                .start_process(id, &record.label, &record.config, self.cols, self.rows)
                .await;
            match result {
                Ok(process) => self.spawn_exit_watcher(id, process),
                Err(e) => {
                    warn!(id, error = %e, "restart_running: failed to start one process");
                    first_err.get_or_insert(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Awaits a single instance's natural exit and runs the cleanup path
    /// (spec.md §4.5 "process exit handling"). No-ops if the process was
    /// already torn down by an explicit `stop`/`restart` — the `is_running`
    /// check loses that race deliberately, since the controller has already
    /// removed the id by the time an explicit stop's own wait resolves.
    fn spawn_exit_watcher(self: &Arc<Self>, id: ProcessId, process: Arc<Process>) {
        let primary = Arc::clone(self);
        tokio::spawn(async move {
            let mut rx = process.wait_for_exit();
            if rx.wait_for(|v| v.is_some()).await.is_err() {
                return;
            }
            if primary.controller.is_running(id) {
                let _ = primary.controller.cleanup_process(id).await;
                primary.publish(Some(id));
                primary.publish(None);
            }
        });
    }

    fn id_for_label(&self, label: &str) -> CoreResult<ProcessId> {
        self.by_label.get(label).copied().ok_or_else(|| WardError::NotFound(label.to_owned()))
    }

    fn record(&self, id: ProcessId) -> CoreResult<&ProcessRecord> {
        self.records.get(&id).ok_or_else(|| WardError::NotFound(id.to_string()))
    }

    fn state(&self) -> AppState {
        AppState {
            selected: *self.selected.lock(),
            records: self
                .records
                .values()
                .map(|r| ProcessRecordView { id: r.id, label: r.label.clone(), config: r.config.clone() })
                .collect(),
        }
    }

    fn views(&self, transient_exit: Option<ProcessId>) -> Vec<ProcessView> {
        self.records
            .values()
            .map(|r| {
                let status = if Some(r.id) == transient_exit {
                    Status::Exited
                } else if self.controller.is_running(r.id) {
                    Status::Running
                } else {
                    Status::Halted
                };
                ProcessView {
                    id: r.id,
                    label: r.label.clone(),
                    status,
                    pid: self.controller.get_pid(r.id),
                    config: r.config.clone(),
                }
            })
            .collect()
    }

    fn state_update(&self, transient_exit: Option<ProcessId>) -> StateUpdate {
        StateUpdate { state: self.state(), process_views: self.views(transient_exit) }
    }

    fn publish(&self, transient_exit: Option<ProcessId>) {
        let redacted = redact::redact_state_update(&self.state_update(transient_exit));
        let _ = self.broadcast_tx.send(redacted);
    }

    async fn shutdown(&self) {
        let ids = self.controller.get_all_process_ids();
        let stop_all = async {
            for id in ids {
                if let Err(e) = self.controller.stop_process(id).await {
                    warn!(id, error = %e, "shutdown: failed to stop one process");
                }
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, stop_all).await.is_err() {
            warn!("shutdown: timed out stopping all processes");
        }
    }
}

/// `Start()` (spec.md §4.5): probe for a stale primary, bind, autostart,
/// serve until a termination signal, then `Stop()`.
pub async fn run(primary: Arc<Primary>, socket_path: PathBuf) -> Result<()> {
    probe_and_clear_stale(&socket_path).await?;

    let listener = UnixListener::bind(&socket_path)?;
    std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o600))?;
    info!(socket = %socket_path.display(), "listening");

    primary.autostart().await;

    let accept = tokio::spawn(server::accept_loop(listener, Arc::clone(&primary)));

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
        _ = sigterm.recv() => info!("received SIGTERM"),
    }

    accept.abort();
    primary.shutdown().await;
    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}

async fn probe_and_clear_stale(socket_path: &Path) -> Result<()> {
    match UnixStream::connect(socket_path).await {
        Ok(mut stream) => {
            let handshake = async {
                crate::ipc::framing::write_envelope(&mut stream, &Envelope::command(Action::List, None))
                    .await?;
                crate::ipc::framing::read_envelope(&mut stream).await
            };
            match tokio::time::timeout(PROBE_TIMEOUT, handshake).await {
                Ok(Ok(Some(_))) => {
                    Err(CliError::AlreadyRunning(socket_path.display().to_string()))
                }
                _ => {
                    let _ = std::fs::remove_file(socket_path);
                    Ok(())
                }
            }
        }
        Err(_) => {
            if socket_path.exists() {
                let _ = std::fs::remove_file(socket_path);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "primary_tests.rs"]
mod tests;
