// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios: spawn the real `ward` binary, talk to it over
//! its actual Unix-socket control plane, and assert the wall-clock and
//! file-side-effect behaviors an external reader would observe.

use std::time::{Duration, Instant};

use ward_core::model::Status;
use ward_specs::{wait_for_view, WardProcess};

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn autostart_process_runs_then_exits() -> anyhow::Result<()> {
    let ward = WardProcess::start(
        r#"
        [procs.hello]
        shell = "printf hello"
        autostart = true

        [procs.idle]
        shell = "sleep 30"
        "#,
    )?;
    let (client, mut updates) = ward.connect(TIMEOUT).await?;

    wait_for_view(&client, &mut updates, "hello", TIMEOUT, |v| v.status == Status::Halted).await?;

    Ok(())
}

#[tokio::test]
async fn stop_of_a_sigterm_ignoring_child_escalates_within_its_timeout() -> anyhow::Result<()> {
    let ward = WardProcess::start(
        r#"
        [procs.stubborn]
        shell = "trap '' TERM; sleep 60"
        stop = 15
        stop_timeout_ms = 200
        "#,
    )?;
    let (client, mut updates) = ward.connect(TIMEOUT).await?;

    client.start_process("stubborn").await?;
    wait_for_view(&client, &mut updates, "stubborn", TIMEOUT, |v| v.status == Status::Running).await?;

    let started = Instant::now();
    client.stop_process("stubborn").await?;
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(1000), "stop took {elapsed:?}, expected well under 1s");
    wait_for_view(&client, &mut updates, "stubborn", Duration::from_millis(500), |v| {
        v.status == Status::Halted
    })
    .await?;

    Ok(())
}

#[tokio::test]
async fn on_kill_hook_fires_exactly_once_across_repeated_stops() -> anyhow::Result<()> {
    let marker_dir = tempfile::tempdir()?;
    let marker = marker_dir.path().join("hook-output");

    let ward = WardProcess::start(&format!(
        r#"
        [procs.watched]
        shell = "sleep 60"
        on_kill = ["/bin/sh", "-c", "echo hook >> {}"]
        "#,
        marker.display()
    ))?;
    let (client, mut updates) = ward.connect(TIMEOUT).await?;

    client.start_process("watched").await?;
    wait_for_view(&client, &mut updates, "watched", TIMEOUT, |v| v.status == Status::Running).await?;

    client.stop_process("watched").await?;
    wait_for_view(&client, &mut updates, "watched", TIMEOUT, |v| v.status == Status::Halted).await?;
    client.stop_process("watched").await?;

    let contents = std::fs::read_to_string(&marker)?;
    assert_eq!(contents.lines().count(), 1, "on_kill ran more than once: {contents:?}");

    Ok(())
}

#[tokio::test]
async fn restart_running_only_cycles_what_was_already_running() -> anyhow::Result<()> {
    let ward = WardProcess::start(
        r#"
        [procs.a]
        shell = "sleep 60"

        [procs.b]
        shell = "sleep 60"
        "#,
    )?;
    let (client, mut updates) = ward.connect(TIMEOUT).await?;

    client.start_process("b").await?;
    wait_for_view(&client, &mut updates, "b", TIMEOUT, |v| v.status == Status::Running).await?;

    client.restart_running().await?;

    wait_for_view(&client, &mut updates, "a", TIMEOUT, |v| v.status == Status::Halted).await?;
    wait_for_view(&client, &mut updates, "b", TIMEOUT, |v| v.status == Status::Running).await?;

    Ok(())
}

#[tokio::test]
async fn env_is_redacted_from_every_broadcast_view() -> anyhow::Result<()> {
    let ward = WardProcess::start(
        r#"
        [procs.secretive]
        shell = "sleep 30"
        env = { SUPER_SECRET = "do-not-leak" }
        "#,
    )?;
    let (client, mut updates) = ward.connect(TIMEOUT).await?;

    wait_for_view(&client, &mut updates, "secretive", TIMEOUT, |v| v.config.env.is_empty()).await?;

    Ok(())
}
