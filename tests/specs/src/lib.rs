// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harness for end-to-end tests that spawn the real `ward` binary and
//! talk to it over its actual Unix-socket control plane.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

use ward_cli::ipc::client::Client;
use ward_core::model::StateUpdate;

/// Resolve the path to the compiled `ward` binary.
pub fn ward_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs -> tests -> workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("ward")
}

/// A running `ward serve` process, killed on drop.
pub struct WardProcess {
    child: Child,
    socket_path: PathBuf,
    _dir: tempfile::TempDir,
}

impl WardProcess {
    /// Write `config_toml` to a temp file and spawn `ward serve` against
    /// it, listening on a socket in the same temp directory.
    pub fn start(config_toml: &str) -> anyhow::Result<Self> {
        let binary = ward_binary();
        anyhow::ensure!(binary.exists(), "ward binary not found at {}", binary.display());

        let dir = tempfile::tempdir()?;
        let config_path = dir.path().join("ward.toml");
        std::fs::write(&config_path, config_toml)?;
        let socket_path = dir.path().join("ward.sock");

        let child = Command::new(&binary)
            .arg("--socket")
            .arg(&socket_path)
            .arg("--log-format")
            .arg("text")
            .arg("--log-level")
            .arg("warn")
            .arg("serve")
            .arg("--config")
            .arg(&config_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child, socket_path, _dir: dir })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Connect to the control socket, retrying until it accepts or
    /// `timeout` elapses.
    pub async fn connect(&self, timeout: Duration) -> anyhow::Result<(Client, tokio::sync::mpsc::Receiver<StateUpdate>)> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match Client::connect(&self.socket_path).await {
                Ok(pair) => return Ok(pair),
                Err(e) => {
                    if tokio::time::Instant::now() > deadline {
                        anyhow::bail!("ward never accepted a connection: {e}");
                    }
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            }
        }
    }
}

impl Drop for WardProcess {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}

/// Actively poll for the named process's view to satisfy `predicate`,
/// issuing a fresh `list` on each round rather than waiting on a single
/// broadcast — a broadcast is a one-shot event that may already have
/// fired (e.g. during autostart, before this connection existed), so
/// passively waiting on the update stream would hang forever on exactly
/// the scenarios this harness needs to observe.
pub async fn wait_for_view<F>(
    client: &Client,
    updates: &mut tokio::sync::mpsc::Receiver<StateUpdate>,
    label: &str,
    timeout: Duration,
    mut predicate: F,
) -> anyhow::Result<()>
where
    F: FnMut(&ward_core::model::ProcessView) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        client.list().await?;
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        anyhow::ensure!(!remaining.is_zero(), "timed out waiting for {label}");
        let Ok(Some(update)) = tokio::time::timeout(remaining, updates.recv()).await else {
            anyhow::bail!("update stream ended while waiting for {label}");
        };
        if let Some(view) = update.process_views.iter().find(|v| v.label == label) {
            if predicate(view) {
                return Ok(());
            }
        }
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("timed out waiting for {label}");
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
    }
}
