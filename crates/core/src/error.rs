// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable error taxonomy shared by the controller, primary server, and IPC
//! layers. Every variant here is a kind a caller can match on; human text
//! lives in the `Display` impl.

use thiserror::Error;

/// Stable, matchable error kinds for the supervision engine.
#[derive(Debug, Error)]
pub enum WardError {
    #[error("malformed process definition: {0}")]
    ConfigError(String),

    #[error("process {0} is already running")]
    AlreadyRunning(String),

    #[error("no such process: {0}")]
    NotFound(String),

    #[error("process definition has neither `shell` nor `cmd`")]
    InvalidConfig,

    #[error("failed to start process: {0}")]
    StartupFailed(String),

    #[error("process did not exit within the stop timeout")]
    StopTimeout,

    #[error("on_kill hook failed: {0}")]
    OnKillFailed(String),

    #[error("unauthorized peer")]
    Unauthorized,

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("disconnected from primary")]
    Disconnected,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WardError>;
