// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process exit codes (spec.md §6). Kept as a small table rather than
//! scattered literals so `main` is the only place that decides to exit.

pub const OK: i32 = 0;
pub const MISUSE: i32 = 2;
pub const NOT_REACHABLE: i32 = 3;
pub const ALREADY_RUNNING: i32 = 4;
pub const CONFIG_ERROR: i32 = 5;

use crate::error::CliError;

/// Map a top-level error to the exit code `main` should use.
pub fn for_error(err: &CliError) -> i32 {
    match err {
        CliError::Config(_) => CONFIG_ERROR,
        CliError::NotReachable(_) => NOT_REACHABLE,
        CliError::AlreadyRunning(_) => ALREADY_RUNNING,
        CliError::Core(ward_core::WardError::Unauthorized) => NOT_REACHABLE,
        _ => 1,
    }
}

#[cfg(test)]
#[path = "exit_code_tests.rs"]
mod tests;
