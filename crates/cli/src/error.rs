// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI-layer error taxonomy. Wraps `ward_core::WardError` and adds the
//! transport/config failures that only make sense above the core (spec.md
//! §7 propagation policy: only `main` decides to terminate the process).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ward_core::WardError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("malformed configuration: {0}")]
    Config(String),

    #[error("primary not reachable at {0}")]
    NotReachable(String),

    #[error("a primary is already running at {0}")]
    AlreadyRunning(String),

    #[error("timed out waiting for a response")]
    Timeout,

    #[error("{0}")]
    Remote(String),
}

pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
