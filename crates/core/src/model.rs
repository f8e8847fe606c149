// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain types: configuration, process records, and the wire-shaped view
//! types broadcast to clients. See `spec.md` §3.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Numeric process ID, assigned deterministically by sorted-label order
/// at config load. Never derived from map iteration order.
pub type ProcessId = u32;

/// A single named process definition, immutable after load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessDef {
    pub label: String,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub cmd: Option<Vec<String>>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub add_path: Vec<String>,
    #[serde(default = "default_stop_signal")]
    pub stop: i32,
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    #[serde(default)]
    pub on_kill: Vec<String>,
    #[serde(default)]
    pub autostart: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub docs: Option<String>,
}

fn default_stop_signal() -> i32 {
    15
}

fn default_stop_timeout_ms() -> u64 {
    3000
}

impl ProcessDef {
    /// Resolve the argv to exec: `shell` wins when both are present.
    pub fn resolve_argv(&self, fallback_shell: &[String]) -> Option<Vec<String>> {
        if let Some(shell) = &self.shell {
            let mut argv = fallback_shell.to_vec();
            argv.push(shell.clone());
            Some(argv)
        } else {
            self.cmd.clone()
        }
    }

    pub fn has_command(&self) -> bool {
        self.shell.is_some() || self.cmd.is_some()
    }
}

/// Global options relevant to the core (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalOptions {
    #[serde(default)]
    pub socket_path: Option<String>,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default = "default_fallback_shell")]
    pub fallback_shell: Vec<String>,
}

fn default_fallback_shell() -> Vec<String> {
    vec!["sh".to_owned(), "-c".to_owned()]
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self { socket_path: None, log_file: None, fallback_shell: default_fallback_shell() }
    }
}

/// Top-level configuration: a set of named process definitions plus
/// global options. Immutable after load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalOptions,
    #[serde(default)]
    pub procs: BTreeMap<String, ProcessDef>,
}

/// A process record: the stable identity assigned at config load.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub id: ProcessId,
    pub label: String,
    pub config: ProcessDef,
}

/// Assign IDs deterministically by sorted label order. Two runs over the
/// same config produce identical IDs (invariant 4 in spec.md §3/§8).
pub fn assign_records(config: &Config) -> Vec<ProcessRecord> {
    let mut labels: Vec<&String> = config.procs.keys().collect();
    labels.sort();
    labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| ProcessRecord {
            id: i as ProcessId,
            label: label.clone(),
            config: config.procs[label].clone(),
        })
        .collect()
}

/// Runtime status of a process, as seen from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Unknown,
    Running,
    Halting,
    Halted,
    /// One-shot transient label emitted on the broadcast following an exit;
    /// subsequent broadcasts report `Halted` (spec.md §9 Open Questions).
    Exited,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Unknown => "Unknown",
            Status::Running => "Running",
            Status::Halting => "Halting",
            Status::Halted => "Halted",
            Status::Exited => "Exited",
        };
        f.write_str(s)
    }
}

/// Shared-with-UI view of a single process (spec.md §3/§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessView {
    pub id: ProcessId,
    pub label: String,
    pub status: Status,
    pub pid: i32,
    pub config: ProcessDef,
}

/// Domain state visible to clients: the currently-selected process and
/// the full record list (redacted before emission — see `redact.rs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    pub selected: Option<ProcessId>,
    pub records: Vec<ProcessRecordView>,
}

/// Wire-shaped copy of a `ProcessRecord` (redacted config).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRecordView {
    pub id: ProcessId,
    pub label: String,
    pub config: ProcessDef,
}

/// Atomic snapshot broadcast after every state-changing command
/// (spec.md §3/§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateUpdate {
    pub state: AppState,
    pub process_views: Vec<ProcessView>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
