// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire schema and the shared command table (spec.md §4.6). Defined once
//! and used by the CLI, the client, and the server dispatcher — no
//! parallel hard-coded switches.

use serde::{Deserialize, Serialize};
use ward_core::model::{AppState, ProcessView};

/// Every action the control plane understands, plus a catch-all for
/// anything a peer sends that isn't one of these — decoding never fails
/// on an unrecognized action string, so the dispatcher can answer with
/// `UnknownAction` instead of the connection dying mid-frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Start,
    Stop,
    Restart,
    Switch,
    StopRunning,
    RestartRunning,
    List,
    #[serde(other)]
    Unknown,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Restart => "restart",
            Action::Switch => "switch",
            Action::StopRunning => "stop-running",
            Action::RestartRunning => "restart-running",
            Action::List => "list",
            Action::Unknown => "unknown",
        }
    }

    /// `start|stop|restart|switch` take a `label`; the rest do not.
    pub fn requires_label(self) -> bool {
        matches!(self, Action::Start | Action::Stop | Action::Restart | Action::Switch)
    }
}

/// The symmetric envelope (spec.md §4.6), discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    #[serde(rename = "cmd")]
    Command {
        action: Action,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    #[serde(rename = "response")]
    Response {
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename = "state")]
    State { state: AppState, views: Vec<ProcessView> },
}

impl Envelope {
    pub fn command(action: Action, label: Option<String>) -> Self {
        Envelope::Command { action, label }
    }

    pub fn ok() -> Self {
        Envelope::Response { ok: true, error: None }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Envelope::Response { ok: false, error: Some(message.into()) }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
