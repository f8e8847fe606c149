// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A registry of instances keyed by numeric ID (spec.md §4.4). All
//! mutations are serialized through an internal write lock; reads use a
//! shared read lock. Grounded in the teacher's
//! `MuxState.sessions: RwLock<HashMap<String, Arc<SessionEntry>>>`
//! registry pattern, generalized from session-by-name to process-by-id.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::error::{Result, WardError};
use crate::instance::Process;
use crate::model::{ProcessDef, ProcessId, Status};
use crate::ring::{ReaderId, RingBuffer};

/// Registry of live process instances.
pub struct ProcessController {
    instances: RwLock<HashMap<ProcessId, Arc<Process>>>,
    fallback_shell: Vec<String>,
}

impl ProcessController {
    pub fn new(fallback_shell: Vec<String>) -> Self {
        Self { instances: RwLock::new(HashMap::new()), fallback_shell }
    }

    /// `StartProcess(id, config) -> Instance | Error` (spec.md §4.4).
    pub async fn start_process(
        &self,
        id: ProcessId,
        label: &str,
        config: &ProcessDef,
        cols: u16,
        rows: u16,
    ) -> Result<Arc<Process>> {
        if self.instances.read().contains_key(&id) {
            return Err(WardError::AlreadyRunning(label.to_owned()));
        }
        if !config.has_command() {
            return Err(WardError::InvalidConfig);
        }

        let scrollback = Arc::new(RingBuffer::with_default_capacity());
        let process = Process::start(label, config, &self.fallback_shell, scrollback, cols, rows)?;

        let mut instances = self.instances.write();
        if instances.contains_key(&id) {
            // Lost a race with a concurrent StartProcess for the same id.
            drop(instances);
            let _ = process.stop(true, false).await;
            return Err(WardError::AlreadyRunning(label.to_owned()));
        }
        instances.insert(id, Arc::clone(&process));
        Ok(process)
    }

    /// `StopProcess(id) -> Error?` (spec.md §4.4).
    pub async fn stop_process(&self, id: ProcessId) -> Result<()> {
        let instance = self
            .instances
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| WardError::NotFound(id.to_string()))?;

        let hook_result = instance.stop(true, true).await;
        self.instances.write().remove(&id);
        hook_result
    }

    /// `CleanupProcess(id) -> Error?` (spec.md §4.4): no signal, no
    /// on_kill, missing id is not an error.
    pub async fn cleanup_process(&self, id: ProcessId) -> Result<()> {
        let instance = self.instances.read().get(&id).cloned();
        if let Some(instance) = instance {
            let _ = instance.stop(false, false).await;
            self.instances.write().remove(&id);
        }
        Ok(())
    }

    pub fn get_process(&self, id: ProcessId) -> Option<Arc<Process>> {
        self.instances.read().get(&id).cloned()
    }

    pub fn get_pid(&self, id: ProcessId) -> i32 {
        self.instances.read().get(&id).map(|p| p.get_pid()).unwrap_or(-1)
    }

    pub fn is_running(&self, id: ProcessId) -> bool {
        self.instances.read().contains_key(&id)
    }

    /// `Running` if registered and not yet marked `cleaned`; `Halting` if
    /// registered but tearing down; `Halted` if absent. `Exited` and
    /// `Unknown` are assigned by callers (primary server, CLI layer
    /// respectively) — the controller only knows about live instances.
    pub fn get_process_status(&self, id: ProcessId) -> Status {
        match self.instances.read().get(&id) {
            Some(instance) if instance.is_cleaned() => Status::Halting,
            Some(_) => Status::Running,
            None => Status::Halted,
        }
    }

    pub fn get_all_process_ids(&self) -> Vec<ProcessId> {
        self.instances.read().keys().copied().collect()
    }

    /// `GetScrollback(id) -> bytes | Error`.
    pub fn get_scrollback(&self, id: ProcessId) -> Result<Vec<u8>> {
        let instances = self.instances.read();
        let instance =
            instances.get(&id).ok_or_else(|| WardError::NotFound(id.to_string()))?;
        Ok(instance.scrollback().bytes())
    }

    /// `ScrollbackAndSubscribe(id) -> (snapshot, reader_id, channel) | Error`.
    /// The only API callers must use to follow live output — never call
    /// `get_scrollback` followed by a separate subscribe, which races with
    /// concurrent writes.
    pub fn scrollback_and_subscribe(
        &self,
        id: ProcessId,
    ) -> Result<(Vec<u8>, ReaderId, mpsc::Receiver<Bytes>)> {
        let instances = self.instances.read();
        let instance =
            instances.get(&id).ok_or_else(|| WardError::NotFound(id.to_string()))?;
        Ok(instance.scrollback().snapshot_and_subscribe())
    }

    /// `UnsubscribeScrollback(id, reader_id)`: best-effort removal.
    pub fn unsubscribe_scrollback(&self, id: ProcessId, reader_id: ReaderId) {
        if let Some(instance) = self.instances.read().get(&id) {
            instance.scrollback().remove_reader(reader_id);
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
