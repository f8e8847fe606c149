// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Peer credential check (spec.md §4.6): the socket is mode 0600, but a
//! setuid-root peer or a shared-homedir misconfiguration could still
//! connect, so every accepted connection is checked against our own UID.

use tokio::net::UnixStream;

use crate::error::{CliError, Result};

pub fn authorize(stream: &UnixStream) -> Result<()> {
    let peer = stream.peer_cred()?;
    let our_uid = rustix::process::getuid().as_raw();
    if peer.uid() == our_uid {
        Ok(())
    } else {
        Err(CliError::Core(ward_core::WardError::Unauthorized))
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
