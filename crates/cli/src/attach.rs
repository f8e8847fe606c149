// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ward attach LABEL` — thin IPC-client command that selects a process
//! and then prints its status transitions as they're broadcast.
//!
//! The control-plane wire protocol (spec.md §4.6/§6) carries only the
//! shared command table and `StateUpdate` broadcasts; it has no raw PTY
//! byte-stream command, and the terminal UI that would render one is an
//! explicit Non-goal (spec.md §1). `attach` is therefore built entirely
//! out of `switch` plus the existing update stream: it selects the named
//! process (the same side effect `ward switch` has) and then follows the
//! broadcasts that name it, printing each status transition until the
//! process halts or the user interrupts with Ctrl+C.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::ipc::client::Client;
use ward_core::model::Status;

pub async fn run(socket_path: &Path, label: &str) -> Result<()> {
    let (client, mut updates) = Client::connect(socket_path).await?;
    client.switch_process(label).await?;
    println!("attached to {label} (Ctrl+C to detach)");

    let mut seen_running = false;
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(update) = update else {
                    println!("{label}: disconnected");
                    break;
                };
                let Some(view) = update.process_views.iter().find(|v| v.label == label) else {
                    continue;
                };
                println!("{label}: {} (pid {})", view.status, view.pid);
                if view.status == Status::Running {
                    seen_running = true;
                } else if seen_running && view.status == Status::Halted {
                    info!(label, "process halted, watch loop exiting");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("detached from {label}");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "attach_tests.rs"]
mod tests;
