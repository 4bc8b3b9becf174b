//! Sockline CLI entry point.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Wire observability**: install the `tracing-subscriber` JSON layer and,
//!    when configured, the OpenTelemetry OTLP exporter.
//! 2. **Load configuration**: read connection definitions from `--config`.
//! 3. **Construct infrastructure**: build a [`connection::ConnectionRegistry`]
//!    over the WebSocket transport factory and register every connection.
//! 4. **Dispatch**: run the requested subcommand and print its JSON result,
//!    then tear every connection down.

mod args;
mod commands;
mod config;
mod observability;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use connection::{Adapter, ConnectionDefinition, ConnectionRegistry, OperationError};
use protocol::ExecutionMode;
use serde_json::Value;
use socket::WebSocketTransportFactory;

use crate::args::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match observability::init() {
        Ok(telemetry) => telemetry,
        Err(err) => {
            eprintln!("sockline: failed to initialise logging: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let code = match run(cli).await {
        Ok(output) => {
            print_json(&output);
            ExitCode::SUCCESS
        }
        Err(err) => report(&err),
    };

    telemetry.shutdown();
    code
}

async fn run(cli: Cli) -> anyhow::Result<Value> {
    let mode = ExecutionMode::parse(&cli.mode);
    let definitions = config::load(&cli.config)?;

    let adapter = Adapter::new(ConnectionRegistry::new(
        Arc::new(WebSocketTransportFactory),
        mode,
    ));
    execute(&adapter, definitions, &cli.connection, cli.command).await
}

/// Registers every connection, runs `command`, then tears everything down.
async fn execute(
    adapter: &Adapter,
    definitions: Vec<ConnectionDefinition>,
    connection: &str,
    command: Command,
) -> anyhow::Result<Value> {
    let result = match register_all(adapter, definitions) {
        Ok(()) => {
            tracing::info!(
                connections = adapter.registry().len(),
                mode = ?adapter.registry().mode(),
                "adapter ready"
            );
            commands::run(adapter, connection, command).await
        }
        Err(err) => Err(err),
    };
    // Also runs when a later registration failed after earlier ones connected.
    adapter.teardown(None).await;
    result
}

fn register_all(adapter: &Adapter, definitions: Vec<ConnectionDefinition>) -> anyhow::Result<()> {
    for definition in definitions {
        let identity = definition.identity.clone().unwrap_or_default();
        adapter
            .register_connection(definition)
            .with_context(|| format!("cannot register connection '{identity}'"))?;
    }
    Ok(())
}

/// Prints server errors as their JSON object, everything else as text.
fn report(err: &anyhow::Error) -> ExitCode {
    match err
        .downcast_ref::<OperationError>()
        .and_then(OperationError::as_adapter_error)
    {
        Some(adapter_err) => print_json(&adapter_err.to_value()),
        None => eprintln!("sockline: {err:#}"),
    }
    ExitCode::FAILURE
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("sockline: cannot render output: {err}"),
    }
}
