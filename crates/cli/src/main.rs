//! gwadmin CLI entry point.
//!
//! This binary is the composition root for the entire console. Responsibilities:
//!
//! 1. **Load configuration**: read `GWADMIN_*` environment variables and
//!    validate them; the console never starts with an invalid configuration.
//! 2. **Wire observability**: configure `tracing-subscriber` with a text or
//!    JSON layer on stderr and, when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an
//!    OpenTelemetry OTLP exporter. All `tracing` spans and events emitted by
//!    every crate in the workspace flow through this layer.
//! 3. **Construct infrastructure**: build the [`admin_api::GatewayClient`].
//! 4. **Dispatch**: parse the command line and run one command; Ctrl-C
//!    cancels the in-flight request through its handle.
//!
//! Exit codes: `0` success, `1` request or I/O failure, `2` usage or
//! configuration error, `130` cancelled.

mod commands;
mod config;
mod observability;

use std::process::ExitCode;

use admin_api::GatewayClient;
use tracing::{error, info};

use crate::commands::{Command, Completion, USAGE};
use crate::config::ConsoleConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("gwadmin: {err}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let config = match ConsoleConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("gwadmin: {err}");
            return ExitCode::from(2);
        }
    };

    let telemetry = match observability::init(config.log_format) {
        Ok(telemetry) => telemetry,
        Err(err) => {
            eprintln!("gwadmin: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let code = match run(command, &config).await {
        Ok(Completion::Done) => ExitCode::SUCCESS,
        Ok(Completion::Canceled) => ExitCode::from(130),
        Err(err) => {
            error!(error = %format!("{err:#}"), "Command failed");
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}

async fn run(command: Command, config: &ConsoleConfig) -> anyhow::Result<Completion> {
    let client = GatewayClient::new(config.server.clone(), &config.client_settings())?;
    info!(server = %client.server(), "Using gateway admin API");
    commands::execute(command, &client, config).await
}
