// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ward start LABEL` — thin IPC-client wrapper around the `start` action.

use std::path::Path;

use crate::error::Result;
use crate::ipc::client::Client;

pub async fn run(socket_path: &Path, label: &str) -> Result<()> {
    let (client, _updates) = Client::connect(socket_path).await?;
    client.start_process(label).await?;
    println!("started {label}");
    Ok(())
}

#[cfg(test)]
#[path = "start_tests.rs"]
mod tests;
