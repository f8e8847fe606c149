// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accept loop and per-connection dispatch (spec.md §4.6).
//!
//! Broadcast discipline is implemented with `tokio::sync::broadcast`
//! rather than a hand-rolled clients map with manual snapshot-under-lock
//! iteration: each connection owns its own `Receiver` and applies the
//! bounded write deadline itself inside its own task. There is no shared
//! registry to hold a lock across, so "never hold the clients lock across
//! a network write" holds trivially while keeping the same effect (a slow
//! or dead client is dropped without blocking anyone else).

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::auth;
use super::framing::{read_envelope, write_envelope};
use super::protocol::{Action, Envelope};
use crate::primary::Primary;

/// Bounded write deadline for a broadcast delivery (spec.md §4.6).
const WRITE_DEADLINE: Duration = Duration::from_millis(500);

pub async fn accept_loop(listener: UnixListener, primary: Arc<Primary>) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let primary = Arc::clone(&primary);
                tokio::spawn(async move { handle_connection(stream, primary).await });
            }
            Err(e) => warn!(error = %e, "accept failed"),
        }
    }
}

async fn handle_connection(stream: UnixStream, primary: Arc<Primary>) {
    if let Err(e) = auth::authorize(&stream) {
        debug!(error = %e, "rejected unauthorized peer");
        return;
    }

    let (mut read_half, mut write_half) = stream.into_split();
    let mut updates = primary.subscribe();

    if write_envelope(&mut write_half, &primary.snapshot_envelope()).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            frame = read_envelope(&mut read_half) => {
                match frame {
                    Ok(Some(Envelope::Command { action, label })) => {
                        let result = primary.dispatch(action, label).await;
                        let response = match &result {
                            Ok(()) => Envelope::ok(),
                            Err(e) => Envelope::err(e.to_string()),
                        };
                        if write_envelope(&mut write_half, &response).await.is_err() {
                            break;
                        }
                        if result.is_ok() && matches!(action, Action::List) {
                            let _ = write_envelope(&mut write_half, &primary.snapshot_envelope()).await;
                        }
                    }
                    Ok(Some(_)) => {
                        // Clients never send `response`/`state`; ignore rather than drop the connection.
                    }
                    Ok(None) | Err(_) => break,
                }
            }
            update = updates.recv() => {
                match update {
                    Ok(update) => {
                        let envelope = Envelope::State { state: update.state, views: update.process_views };
                        let write = write_envelope(&mut write_half, &envelope);
                        if tokio::time::timeout(WRITE_DEADLINE, write).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
