// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ward restart-running` — thin IPC-client wrapper around the
//! `restart-running` action (only the currently-running set is cycled).

use std::path::Path;

use crate::error::Result;
use crate::ipc::client::Client;

pub async fn run(socket_path: &Path) -> Result<()> {
    let (client, _updates) = Client::connect(socket_path).await?;
    client.restart_running().await?;
    println!("restarted every running process");
    Ok(())
}

#[cfg(test)]
#[path = "restart_running_tests.rs"]
mod tests;
