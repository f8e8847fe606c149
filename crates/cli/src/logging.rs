// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tracing-subscriber` wiring: text or JSON output to stderr, or to an
//! append-only log file when `global.log_file` names one.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

#[derive(Clone)]
enum Sink {
    Stderr,
    File(Arc<Mutex<std::fs::File>>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Stderr => io::stderr().write(buf),
            Sink::File(f) => f.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stderr => io::stderr().flush(),
            Sink::File(f) => f.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).flush(),
        }
    }
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Idempotent per-process expectation: call
/// once, from `main`, before anything logs.
pub fn init(log_format: &str, log_level: &str, log_file: Option<&Path>) -> io::Result<()> {
    let sink = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Sink::File(Arc::new(Mutex::new(file)))
        }
        None => Sink::Stderr,
    };

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .with_env_filter(build_filter(log_level))
            .with_writer(move || sink.clone())
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(build_filter(log_level))
            .with_writer(move || sink.clone())
            .init();
    }
    Ok(())
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
