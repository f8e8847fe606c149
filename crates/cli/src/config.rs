// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line surface and on-disk process-definition loading. The clap
//! struct here is the outer shell; the domain config it ultimately feeds
//! is `ward_core::model::Config`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::{CliError, Result};

/// Supervises a configured set of long-running processes.
#[derive(Debug, Parser)]
#[command(name = "ward", version, about)]
pub struct Cli {
    /// Path to the control socket. Overrides the default derived from the
    /// working directory.
    #[arg(long, global = true, env = "WARD_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, global = true, env = "WARD_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, env = "WARD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the primary supervisor in the foreground.
    Serve {
        /// Path to the TOML process-definition file.
        #[arg(long, env = "WARD_CONFIG")]
        config: PathBuf,
    },
    /// Start a process by label.
    Start { label: String },
    /// Stop a process by label.
    Stop { label: String },
    /// Stop then start a process by label.
    Restart { label: String },
    /// Stop every currently-running process.
    StopRunning,
    /// Stop, then start, every currently-running process.
    RestartRunning,
    /// Change the currently-selected process; starts nothing.
    Switch { label: String },
    /// List configured processes and their status.
    List,
    /// Attach an interactive terminal to a running process.
    Attach { label: String },
}

/// Load and parse a TOML process-definition file into the domain config.
pub fn load_process_config(path: &Path) -> Result<ward_core::model::Config> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
