// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ward switch LABEL` — thin IPC-client wrapper around the `switch`
//! action. Updates the primary's selection only; starts nothing
//! (spec.md §9 Open Questions: switch is kept pure).

use std::path::Path;

use crate::error::Result;
use crate::ipc::client::Client;

pub async fn run(socket_path: &Path, label: &str) -> Result<()> {
    let (client, _updates) = Client::connect(socket_path).await?;
    client.switch_process(label).await?;
    println!("switched to {label}");
    Ok(())
}

#[cfg(test)]
#[path = "switch_tests.rs"]
mod tests;
