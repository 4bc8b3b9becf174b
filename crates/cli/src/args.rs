use std::path::PathBuf;

use clap::{Parser, Subcommand};
use protocol::Method;
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "sockline", version, about = "Talk to a socket-backed REST server")]
pub struct Cli {
    /// Connection definitions (JSON)
    #[arg(long, env = "SOCKLINE_CONFIG", default_value = "sockline.json", global = true)]
    pub config: PathBuf,

    /// Identity of the connection to use
    #[arg(long, default_value = "default", global = true)]
    pub connection: String,

    /// Execution mode; `production` disables simulated latency
    #[arg(long, env = "SOCKLINE_ENV", default_value = "development", global = true)]
    pub mode: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find records matching criteria
    Find {
        collection: String,
        /// Criteria object, e.g. '{"where":{"name":"rex"}}'
        #[arg(value_parser = parse_json, default_value = "{}")]
        criteria: Value,
    },
    /// Create one record
    Create {
        collection: String,
        #[arg(value_parser = parse_json)]
        values: Value,
    },
    /// Update the record(s) selected by criteria
    Update {
        collection: String,
        #[arg(value_parser = parse_json)]
        criteria: Value,
        #[arg(value_parser = parse_json)]
        values: Value,
    },
    /// Destroy the record(s) selected by criteria
    Destroy {
        collection: String,
        #[arg(value_parser = parse_json)]
        criteria: Value,
    },
    /// Print the locally registered schema of a collection
    Describe { collection: String },
    /// Find records with associations populated
    Join {
        collection: String,
        #[arg(value_parser = parse_json)]
        criteria: Value,
    },
    /// Add to an association, e.g. '{"id":1,"association":"toys","foreignId":7}'
    AddTo {
        collection: String,
        #[arg(value_parser = parse_json)]
        command: Value,
    },
    /// Remove from an association
    RemoveFrom {
        collection: String,
        #[arg(value_parser = parse_json)]
        command: Value,
    },
    /// Send a raw request over the socket
    Request {
        method: Method,
        url: String,
        #[arg(value_parser = parse_json, default_value = "null")]
        data: Value,
    },
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}
