// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed IPC client (spec.md §4.7): one reader loop demultiplexes
//! `response` frames (matched to the single outstanding request) from
//! `state` frames (forwarded to an updates channel), so callers never see
//! the wire envelope directly.

use std::path::Path;
use std::time::Duration;

use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, Mutex};

use ward_core::model::StateUpdate;

use super::framing::{read_envelope, write_envelope};
use super::protocol::{Action, Envelope};
use crate::error::{CliError, Result};

/// How long a request waits for its matching response (spec.md §4.7).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Depth of the updates channel. A client that never drains it simply
/// stops receiving live updates once the reader's send blocks; it keeps
/// talking to the request/response half either way.
const UPDATES_CAPACITY: usize = 64;

pub struct Client {
    write_half: Mutex<OwnedWriteHalf>,
    responses: Mutex<mpsc::Receiver<Result<()>>>,
}

impl Client {
    /// Connect and start the background reader. Returns the client plus
    /// the receiving end of its live-update channel; the channel closes
    /// when the connection is lost.
    pub async fn connect(socket_path: &Path) -> Result<(Self, mpsc::Receiver<StateUpdate>)> {
        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|e| CliError::NotReachable(format!("{}: {e}", socket_path.display())))?;
        let (read_half, write_half) = stream.into_split();

        let (response_tx, response_rx) = mpsc::channel(1);
        let (update_tx, update_rx) = mpsc::channel(UPDATES_CAPACITY);
        tokio::spawn(read_loop(read_half, response_tx, update_tx));

        let client = Self { write_half: Mutex::new(write_half), responses: Mutex::new(response_rx) };
        Ok((client, update_rx))
    }

    pub async fn start_process(&self, label: &str) -> Result<()> {
        self.request(Action::Start, Some(label.to_owned())).await
    }

    pub async fn stop_process(&self, label: &str) -> Result<()> {
        self.request(Action::Stop, Some(label.to_owned())).await
    }

    pub async fn restart_process(&self, label: &str) -> Result<()> {
        self.request(Action::Restart, Some(label.to_owned())).await
    }

    pub async fn switch_process(&self, label: &str) -> Result<()> {
        self.request(Action::Switch, Some(label.to_owned())).await
    }

    pub async fn stop_running(&self) -> Result<()> {
        self.request(Action::StopRunning, None).await
    }

    pub async fn restart_running(&self) -> Result<()> {
        self.request(Action::RestartRunning, None).await
    }

    /// Triggers a fresh snapshot; the caller reads it off the updates
    /// channel returned by `connect` rather than from this call's result.
    pub async fn list(&self) -> Result<()> {
        self.request(Action::List, None).await
    }

    async fn request(&self, action: Action, label: Option<String>) -> Result<()> {
        {
            let mut write_half = self.write_half.lock().await;
            write_envelope(&mut *write_half, &Envelope::command(action, label)).await?;
        }
        let mut responses = self.responses.lock().await;
        match tokio::time::timeout(REQUEST_TIMEOUT, responses.recv()).await {
            Ok(Some(result)) => result,
            Ok(None) => Err(CliError::Core(ward_core::WardError::Disconnected)),
            Err(_) => Err(CliError::Timeout),
        }
    }
}

async fn read_loop(
    mut read_half: OwnedReadHalf,
    response_tx: mpsc::Sender<Result<()>>,
    update_tx: mpsc::Sender<StateUpdate>,
) {
    loop {
        let frame = match read_envelope(&mut read_half).await {
            Ok(Some(frame)) => frame,
            Ok(None) | Err(_) => return,
        };
        match frame {
            Envelope::Response { ok: true, .. } => {
                if response_tx.send(Ok(())).await.is_err() {
                    return;
                }
            }
            Envelope::Response { ok: false, error } => {
                let message = error.unwrap_or_else(|| "request failed".to_owned());
                if response_tx.send(Err(CliError::Remote(message))).await.is_err() {
                    return;
                }
            }
            Envelope::State { state, views } => {
                let update = StateUpdate { state, process_views: views };
                if update_tx.send(update).await.is_err() {
                    return;
                }
            }
            Envelope::Command { .. } => {
                // Servers never send `cmd`; ignore rather than tear down the connection.
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
