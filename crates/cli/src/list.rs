// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ward list` — print the current `ProcessView` list. The server already
//! sends a snapshot the moment a connection is accepted (spec.md §2 data
//! flow: "they receive a redacted state-update snapshot on connect"), so
//! this command just connects, reads that first update, and prints it.

use std::path::Path;

use crate::error::{CliError, Result};
use crate::ipc::client::Client;

pub async fn run(socket_path: &Path) -> Result<()> {
    let (_client, mut updates) = Client::connect(socket_path).await?;
    let snapshot = updates.recv().await.ok_or(CliError::Timeout)?;

    for view in &snapshot.process_views {
        println!("{:<5} {:<20} {:<8} pid={}", view.id, view.label, view.status, view.pid);
    }
    Ok(())
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
