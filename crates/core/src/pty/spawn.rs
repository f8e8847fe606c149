// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opens a PTY pair, spawns a child attached to the slave side, and puts
//! the master into raw mode (spec.md §4.2).
//!
//! Grounded in `other_examples` PTY spawners that use `openpty` +
//! `std::process::Command::pre_exec` (`setsid` + `TIOCSCTTY`) instead of
//! `forkpty`, since this spec requires raw-mode configuration on the
//! master to be an independently-failable step that can still unwind a
//! partially-started child — a single `forkpty` + `execvp` call can't
//! express that.

use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, RawFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU16, Ordering};

use nix::libc;
use nix::pty::{openpty, Winsize};
use nix::sys::signal::{kill, Signal};
use nix::sys::termios::{self, SetArg};
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::{dup, Pid};
use tokio::io::unix::AsyncFd;

use super::nbio::{set_nonblocking, PtyFd};
use crate::error::{Result, WardError};

/// Default terminal size when the caller doesn't specify one (spec.md §4.2).
pub const DEFAULT_COLS: u16 = 80;
pub const DEFAULT_ROWS: u16 = 24;

/// An opened PTY with a child attached to its slave side.
pub struct Pty {
    master: AsyncFd<PtyFd>,
    child: Child,
    cols: AtomicU16,
    rows: AtomicU16,
}

impl Pty {
    /// Spawn `argv[0] argv[1..]` on a fresh PTY.
    ///
    /// `env` is the fully-resolved environment (see `env_build::build_env`).
    /// On any failure after the child has been forked, the child is killed
    /// and the master is closed before returning — no partial state leaks.
    pub fn spawn(
        argv: &[String],
        cwd: Option<&str>,
        env: &[(String, String)],
        cols: u16,
        rows: u16,
    ) -> Result<Self> {
        let Some(program) = argv.first() else {
            return Err(WardError::InvalidConfig);
        };

        let winsize = Winsize { ws_row: rows, ws_col: cols, ws_xpixel: 0, ws_ypixel: 0 };
        let pty = openpty(Some(&winsize), None)
            .map_err(|e| WardError::StartupFailed(format!("openpty failed: {e}")))?;
        let master = pty.master;
        let slave = pty.slave;

        let mut cmd = Command::new(program);
        cmd.args(&argv[1..]);
        cmd.env_clear();
        cmd.envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let slave_raw: RawFd = slave.as_raw_fd();
        // SAFETY: `dup` returns a fresh, valid, open fd that we immediately
        // hand off to `Stdio`, which takes ownership of it.
        #[allow(unsafe_code)]
        unsafe {
            cmd.stdin(Stdio::from_raw_fd(dup(slave_raw).map_err(|e| {
                WardError::StartupFailed(format!("dup slave for stdin: {e}"))
            })?));
            cmd.stdout(Stdio::from_raw_fd(dup(slave_raw).map_err(|e| {
                WardError::StartupFailed(format!("dup slave for stdout: {e}"))
            })?));
            cmd.stderr(Stdio::from_raw_fd(dup(slave_raw).map_err(|e| {
                WardError::StartupFailed(format!("dup slave for stderr: {e}"))
            })?));
        }

        let master_raw: RawFd = master.as_raw_fd();
        // SAFETY: `pre_exec` runs in the forked child between fork and exec.
        // Only async-signal-safe calls are made: setsid(2), the TIOCSCTTY
        // ioctl on the about-to-be-stdin slave fd, and closing the child's
        // leftover copy of the master fd.
        #[allow(unsafe_code)]
        unsafe {
            cmd.pre_exec(move || {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                if libc::ioctl(0, libc::TIOCSCTTY as libc::c_ulong, 0) == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                libc::close(master_raw);
                Ok(())
            });
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return Err(WardError::StartupFailed(format!("spawn failed: {e}")));
            }
        };

        // The slave side now only needs to live in the child; the parent's
        // copy (duplicated into the child's stdio) can be dropped.
        drop(slave);

        if let Err(e) = configure_raw_master(master.as_fd()) {
            // Raw-mode configuration failed: unwind fully per spec.md §4.2.
            let mut child = child;
            let _ = kill(Pid::from_raw(child.id() as i32), Signal::SIGKILL);
            let _ = child.wait();
            drop(master);
            return Err(WardError::StartupFailed(format!("raw mode configuration failed: {e}")));
        }

        let afd = AsyncFd::new(PtyFd(master))
            .map_err(|e| WardError::StartupFailed(format!("AsyncFd::new failed: {e}")))?;

        Ok(Self {
            master: afd,
            child,
            cols: AtomicU16::new(cols),
            rows: AtomicU16::new(rows),
        })
    }

    pub fn master(&self) -> &AsyncFd<PtyFd> {
        &self.master
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Resize the PTY via the `TIOCSWINSZ` ioctl on the master fd.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.cols.store(cols, Ordering::Relaxed);
        self.rows.store(rows, Ordering::Relaxed);
        let ws = Winsize { ws_row: rows, ws_col: cols, ws_xpixel: 0, ws_ypixel: 0 };
        let raw: RawFd = self.master.get_ref().0.as_raw_fd();
        // SAFETY: TIOCSWINSZ is a well-defined ioctl; `ws` is fully initialized
        // and outlives the call.
        #[allow(unsafe_code)]
        let ret = unsafe { libc::ioctl(raw, libc::TIOCSWINSZ, &ws) };
        if ret < 0 {
            return Err(WardError::Io(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    pub async fn wait(&self) -> Result<ExitStatus> {
        let pid = self.child.id();
        let status = tokio::task::spawn_blocking(move || wait_for_exit(Pid::from_raw(pid as i32)))
            .await
            .map_err(|e| WardError::StartupFailed(format!("join wait thread: {e}")))??;
        Ok(status)
    }
}

/// Put the PTY master into non-canonical raw mode and non-blocking I/O.
fn configure_raw_master(master: BorrowedFd<'_>) -> std::result::Result<(), std::io::Error> {
    let mut termios = termios::tcgetattr(master).map_err(nix_to_io)?;
    termios::cfmakeraw(&mut termios);
    termios::tcsetattr(master, SetArg::TCSANOW, &termios).map_err(nix_to_io)?;
    set_nonblocking(&master)?;
    Ok(())
}

fn nix_to_io(e: nix::Error) -> std::io::Error {
    std::io::Error::from_raw_os_error(e as i32)
}

/// Exit status of a waited-for child: either an exit code or a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

fn wait_for_exit(pid: Pid) -> Result<ExitStatus> {
    use nix::sys::wait::WaitStatus;
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                return Ok(ExitStatus { code: Some(code), signal: None })
            }
            Ok(WaitStatus::Signaled(_, sig, _)) => {
                return Ok(ExitStatus { code: None, signal: Some(sig as i32) })
            }
            Ok(_) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => return Err(WardError::Io(std::io::Error::from_raw_os_error(e as i32))),
        }
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        // Best-effort graceful shutdown: SIGHUP then SIGKILL.
        let pid = Pid::from_raw(self.child.id() as i32);
        let _ = kill(pid, Signal::SIGHUP);
        std::thread::sleep(std::time::Duration::from_millis(50));
        let _ = kill(pid, Signal::SIGKILL);
        let _ = waitpid(pid, Some(WaitPidFlag::WNOHANG));
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
