// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;
use tracing::error;

use ward_cli::config::{load_process_config, Cli, Command};
use ward_cli::error::CliError;
use ward_cli::primary::Primary;
use ward_cli::{attach, exit_code, list, logging, restart, restart_running, socket_path, start, stop, stop_running, switch};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Command::Serve { config } => load_process_config(config).ok().and_then(|c| c.global.log_file),
        _ => None,
    };
    if let Err(e) = logging::init(&cli.log_format, &cli.log_level, log_file.as_deref().map(std::path::Path::new))
    {
        eprintln!("error: failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let socket = cli.socket.clone().unwrap_or_else(|| {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        socket_path::resolve(&cwd)
    });

    let result = dispatch(cli.command, &socket).await;
    match result {
        Ok(()) => std::process::exit(exit_code::OK),
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            std::process::exit(exit_code::for_error(&e));
        }
    }
}

async fn dispatch(command: Command, socket: &std::path::Path) -> Result<(), CliError> {
    match command {
        Command::Serve { config: config_path } => {
            let config = load_process_config(&config_path)?;
            let primary = Primary::new(&config);
            ward_cli::primary::run(primary, socket.to_path_buf()).await
        }
        Command::Start { label } => start::run(socket, &label).await,
        Command::Stop { label } => stop::run(socket, &label).await,
        Command::Restart { label } => restart::run(socket, &label).await,
        Command::StopRunning => stop_running::run(socket).await,
        Command::RestartRunning => restart_running::run(socket).await,
        Command::Switch { label } => switch::run(socket, &label).await,
        Command::List => list::run(socket).await,
        Command::Attach { label } => attach::run(socket, &label).await,
    }
}
