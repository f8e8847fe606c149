// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket path policy (spec.md §6): default under the user's runtime
//! directory, named after the working directory's hash, mode 0600.
//! Overridable via `WARD_SOCKET`.

use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

pub const ENV_SOCKET: &str = "WARD_SOCKET";

/// Resolve the effective socket path for the given working directory.
pub fn resolve(cwd: &Path) -> PathBuf {
    if let Ok(p) = std::env::var(ENV_SOCKET) {
        return PathBuf::from(p);
    }
    runtime_dir().join(format!("ward-{}.sock", hash_cwd(cwd)))
}

fn runtime_dir() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR").map(PathBuf::from).unwrap_or_else(std::env::temp_dir)
}

fn hash_cwd(cwd: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cwd.as_os_str().as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(10).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
#[path = "socket_path_tests.rs"]
mod tests;
