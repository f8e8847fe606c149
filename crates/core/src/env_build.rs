// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment construction for a spawned child (spec.md §4.2).
//!
//! Start from the parent's environment. If `add_path` is non-empty,
//! filter out existing `PATH` entries and append one consolidated
//! `PATH=...:add1:add2`. Then append each `env` pair (last write wins).

use std::collections::BTreeMap;

/// Build the final environment for a child process.
///
/// Resolution of the open question in spec.md §9 ("does the consolidated
/// PATH start with a leading colon when the parent's PATH is empty and
/// `add_path` is non-empty?"): no leading colon. An empty leading segment
/// in `PATH` means "current directory" on most shells, which is not what
/// `add_path` is asking for — this implementation joins the parent's
/// (possibly empty) `PATH` with the `add_path` entries using `:` only
/// between non-empty segments. See DESIGN.md for the recorded decision.
pub fn build_env(
    parent_env: impl IntoIterator<Item = (String, String)>,
    add_path: &[String],
    extra: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    let mut env: Vec<(String, String)> = parent_env.into_iter().collect();

    if !add_path.is_empty() {
        let existing_path = env
            .iter()
            .position(|(k, _)| k == "PATH")
            .map(|idx| env.remove(idx).1)
            .unwrap_or_default();

        let mut segments: Vec<&str> = Vec::new();
        if !existing_path.is_empty() {
            segments.push(existing_path.as_str());
        }
        for p in add_path {
            segments.push(p.as_str());
        }
        env.push(("PATH".to_owned(), segments.join(":")));
    }

    for (k, v) in extra {
        if let Some(existing) = env.iter_mut().find(|(ek, _)| ek == k) {
            existing.1 = v.clone();
        } else {
            env.push((k.clone(), v.clone()));
        }
    }

    env
}

#[cfg(test)]
#[path = "env_build_tests.rs"]
mod tests;
