// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ward stop LABEL` — thin IPC-client wrapper around the `stop` action.

use std::path::Path;

use crate::error::Result;
use crate::ipc::client::Client;

pub async fn run(socket_path: &Path, label: &str) -> Result<()> {
    let (client, _updates) = Client::connect(socket_path).await?;
    client.stop_process(label).await?;
    println!("stopped {label}");
    Ok(())
}

#[cfg(test)]
#[path = "stop_tests.rs"]
mod tests;
