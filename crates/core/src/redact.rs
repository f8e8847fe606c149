// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Produces a deep-enough copy of domain state suitable for IPC
//! (spec.md §4.9): every process config has its `env` nulled out before
//! being handed to a client. Never mutates the original.

use crate::model::{AppState, ProcessDef, ProcessRecordView, ProcessView, StateUpdate};

fn redact_config(config: &ProcessDef) -> ProcessDef {
    ProcessDef { env: Default::default(), ..config.clone() }
}

fn redact_record(record: &ProcessRecordView) -> ProcessRecordView {
    ProcessRecordView {
        id: record.id,
        label: record.label.clone(),
        config: redact_config(&record.config),
    }
}

fn redact_view(view: &ProcessView) -> ProcessView {
    ProcessView {
        id: view.id,
        label: view.label.clone(),
        status: view.status,
        pid: view.pid,
        config: redact_config(&view.config),
    }
}

/// Redact an `AppState` snapshot before it leaves the process.
pub fn redact_state(state: &AppState) -> AppState {
    AppState { selected: state.selected, records: state.records.iter().map(redact_record).collect() }
}

/// Redact a `StateUpdate` payload: both the `state` field and every
/// `ProcessView.config`.
pub fn redact_state_update(update: &StateUpdate) -> StateUpdate {
    StateUpdate {
        state: redact_state(&update.state),
        process_views: update.process_views.iter().map(redact_view).collect(),
    }
}

#[cfg(test)]
#[path = "redact_tests.rs"]
mod tests;
