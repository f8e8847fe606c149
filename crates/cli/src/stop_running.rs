// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ward stop-running` — thin IPC-client wrapper around the
//! `stop-running` action.

use std::path::Path;

use crate::error::Result;
use crate::ipc::client::Client;

pub async fn run(socket_path: &Path) -> Result<()> {
    let (client, _updates) = Client::connect(socket_path).await?;
    client.stop_running().await?;
    println!("stopped every running process");
    Ok(())
}

#[cfg(test)]
#[path = "stop_running_tests.rs"]
mod tests;
