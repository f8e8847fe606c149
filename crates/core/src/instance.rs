// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single managed child process (spec.md §4.3).
//!
//! `Process::start` opens the PTY, spawns the child, then spawns two
//! long-lived tasks: a "waiter" that blocks on the child's exit and
//! publishes the result exactly once, and a "copier" that pumps PTY
//! output into the scrollback ring buffer. Both end naturally when the
//! PTY closes.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::env_build::build_env;
use crate::error::{Result, WardError};
use crate::model::ProcessDef;
use crate::pty::spawn::{ExitStatus, Pty};
use crate::ring::SharedRingBuffer;

/// Default extra grace period after SIGKILL before giving up on reaping
/// (spec.md §4.4: "wait up to a further 2s").
const KILL_GRACE: Duration = Duration::from_secs(2);

/// On-kill hook timeout (spec.md §5).
const ON_KILL_TIMEOUT: Duration = Duration::from_secs(30);

/// A running (or just-exited) child and everything needed to supervise it.
///
/// `WaitForExit` is modeled as a `tokio::sync::watch` channel rather than a
/// literal single-shot oneshot: the underlying OS wait is still performed
/// exactly once, by the internal waiter task, but both the controller's
/// background natural-exit watcher and `StopProcess`'s own bounded wait
/// need to observe that same terminal event without racing on `waitpid`
/// themselves. Each `watch::Receiver` clone independently observes the one
/// `None -> Some` transition, which preserves "yields the result once."
pub struct Process {
    pty: Pty,
    pid: AtomicI32,
    scrollback: SharedRingBuffer,
    exit_rx: watch::Receiver<Option<ExitStatus>>,
    cleaned: Mutex<bool>,
    on_kill_fired: AtomicBool,
    def: ProcessDef,
    label: String,
}

impl Process {
    /// Start lifecycle (spec.md §4.3): open PTY, spawn, configure size and
    /// raw mode, spawn the waiter and copier tasks.
    pub fn start(
        label: &str,
        def: &ProcessDef,
        fallback_shell: &[String],
        scrollback: SharedRingBuffer,
        cols: u16,
        rows: u16,
    ) -> Result<Arc<Self>> {
        let argv = def.resolve_argv(fallback_shell).ok_or(WardError::InvalidConfig)?;
        let env = build_env(std::env::vars(), &def.add_path, &def.env);
        let pty = Pty::spawn(&argv, def.cwd.as_deref(), &env, cols, rows)?;
        let pid = pty.pid() as i32;

        let (exit_tx, exit_rx) = watch::channel(None);

        let process = Arc::new(Self {
            pty,
            pid: AtomicI32::new(pid),
            scrollback,
            exit_rx,
            cleaned: Mutex::new(false),
            on_kill_fired: AtomicBool::new(false),
            def: def.clone(),
            label: label.to_owned(),
        });

        spawn_waiter(Arc::clone(&process), exit_tx);
        spawn_copier(Arc::clone(&process));

        Ok(process)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> &ProcessDef {
        &self.def
    }

    /// `SendBytes(bytes)`: write to the PTY master, best-effort.
    pub async fn send_bytes(&self, data: &[u8]) {
        if let Err(e) = crate::pty::nbio::write_all(self.pty.master(), data).await {
            debug!(pid = self.get_pid(), error = %e, "send_bytes failed");
        }
    }

    /// `WaitForExit()`: a receiver that observes the exit result exactly once.
    pub fn wait_for_exit(&self) -> watch::Receiver<Option<ExitStatus>> {
        self.exit_rx.clone()
    }

    /// `GetPID()`: current PID, or -1 once reaped.
    pub fn get_pid(&self) -> i32 {
        self.pid.load(Ordering::Acquire)
    }

    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.pty.resize(cols, rows)
    }

    pub fn scrollback(&self) -> &SharedRingBuffer {
        &self.scrollback
    }

    pub fn is_cleaned(&self) -> bool {
        *self.cleaned.lock()
    }

    /// Tear the instance down.
    ///
    /// `send_signal`: when true (the `StopProcess` path), send the
    /// configured stop signal, wait up to `stop_timeout_ms`, escalate to
    /// SIGKILL on timeout, then wait a further grace period. When false
    /// (the `CleanupProcess` path for a child that already exited on its
    /// own), no signal is sent.
    ///
    /// `run_on_kill`: when true and the config has a non-empty `on_kill`,
    /// run the hook exactly once (latched by `on_kill_fired`).
    ///
    /// Idempotent: a second call on an already-cleaned instance is a no-op.
    pub async fn stop(&self, send_signal: bool, run_on_kill: bool) -> Result<()> {
        {
            let mut cleaned = self.cleaned.lock();
            if *cleaned {
                return Ok(());
            }
            *cleaned = true;
        }

        if send_signal {
            let pid = Pid::from_raw(self.get_pid());
            let stop_signal = Signal::try_from(self.def.stop).unwrap_or(Signal::SIGTERM);
            send_signal_ignoring_esrch(pid, stop_signal);

            let mut rx = self.wait_for_exit();
            let timeout = Duration::from_millis(self.def.stop_timeout_ms);
            let exited = matches!(
                tokio::time::timeout(timeout, rx.wait_for(|v| v.is_some())).await,
                Ok(Ok(_))
            );

            if !exited {
                send_signal_ignoring_esrch(pid, Signal::SIGKILL);
                let reaped = matches!(
                    tokio::time::timeout(KILL_GRACE, rx.wait_for(|v| v.is_some())).await,
                    Ok(Ok(_))
                );
                if !reaped {
                    warn!(label = %self.label, pid = pid.as_raw(), "process did not exit after SIGKILL");
                }
            }
        }

        self.pid.store(-1, Ordering::Release);

        let mut hook_result = Ok(());
        if run_on_kill
            && !self.def.on_kill.is_empty()
            && !self.on_kill_fired.swap(true, Ordering::AcqRel)
        {
            hook_result = run_on_kill_hook(&self.def).await;
        }

        hook_result
    }
}

fn send_signal_ignoring_esrch(pid: Pid, sig: Signal) {
    match signal::kill(pid, sig) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!(pid = pid.as_raw(), signal = ?sig, error = %e, "failed to signal process"),
    }
}

async fn run_on_kill_hook(def: &ProcessDef) -> Result<()> {
    let env = build_env(std::env::vars(), &def.add_path, &def.env);
    let hook = def.on_kill.clone();
    let cwd = def.cwd.clone();

    let run = async move {
        let mut cmd = tokio::process::Command::new(&hook[0]);
        cmd.args(&hook[1..]);
        cmd.env_clear();
        cmd.envs(env);
        if let Some(dir) = &cwd {
            cmd.current_dir(dir);
        }
        cmd.status().await
    };

    match tokio::time::timeout(ON_KILL_TIMEOUT, run).await {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(WardError::OnKillFailed(format!("exited with {status}"))),
        Ok(Err(e)) => Err(WardError::OnKillFailed(e.to_string())),
        Err(_) => Err(WardError::OnKillFailed("on_kill hook timed out".to_owned())),
    }
}

fn spawn_waiter(process: Arc<Process>, exit_tx: watch::Sender<Option<ExitStatus>>) {
    tokio::spawn(async move {
        match process.pty.wait().await {
            Ok(status) => {
                process.pid.store(-1, Ordering::Release);
                let _ = exit_tx.send(Some(status));
            }
            Err(e) => {
                warn!(label = %process.label, error = %e, "wait failed");
                process.pid.store(-1, Ordering::Release);
                let _ = exit_tx.send(Some(ExitStatus { code: None, signal: None }));
            }
        }
    });
}

fn spawn_copier(process: Arc<Process>) {
    tokio::spawn(async move {
        let mut buf = vec![0u8; 8192];
        loop {
            match crate::pty::nbio::read_chunk(process.pty.master(), &mut buf).await {
                Ok(0) => break,
                Ok(n) => process.scrollback.write(&buf[..n]),
                Err(e) if e.raw_os_error() == Some(nix::libc::EIO) => break,
                Err(e) => {
                    debug!(label = %process.label, error = %e, "copier read failed");
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
