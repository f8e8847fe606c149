// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ward restart LABEL` — thin IPC-client wrapper around the `restart`
//! action (stop, wait for cleanup, then start).

use std::path::Path;

use crate::error::Result;
use crate::ipc::client::Client;

pub async fn run(socket_path: &Path, label: &str) -> Result<()> {
    let (client, _updates) = Client::connect(socket_path).await?;
    client.restart_process(label).await?;
    println!("restarted {label}");
    Ok(())
}

#[cfg(test)]
#[path = "restart_tests.rs"]
mod tests;
