//! Maps parsed subcommands onto adapter calls.

use anyhow::Context;
use connection::Adapter;
use protocol::{AssociationCommand, Criteria};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::args::Command;

/// Runs one command against `connection` and returns the JSON to print.
///
/// Adapter failures come back as [`connection::OperationError`] inside the
/// `anyhow` chain so the caller can render server errors verbatim.
pub async fn run(adapter: &Adapter, connection: &str, command: Command) -> anyhow::Result<Value> {
    let output = match command {
        Command::Find {
            collection,
            criteria,
        } => {
            let criteria: Criteria = decode("criteria", criteria)?;
            Value::Array(adapter.find(connection, &collection, &criteria).await?)
        }
        Command::Create { collection, values } => {
            adapter.create(connection, &collection, &values).await?
        }
        Command::Update {
            collection,
            criteria,
            values,
        } => {
            let criteria: Criteria = decode("criteria", criteria)?;
            Value::Array(
                adapter
                    .update(connection, &collection, &criteria, &values)
                    .await?,
            )
        }
        Command::Destroy {
            collection,
            criteria,
        } => {
            let criteria: Criteria = decode("criteria", criteria)?;
            Value::Array(adapter.destroy(connection, &collection, &criteria).await?)
        }
        Command::Describe { collection } => adapter
            .describe(connection, &collection)?
            .map(|schema| schema.definition().clone())
            .unwrap_or(Value::Null),
        Command::Join {
            collection,
            criteria,
        } => {
            let criteria: Criteria = decode("criteria", criteria)?;
            Value::Array(adapter.join(connection, &collection, criteria).await?)
        }
        Command::AddTo {
            collection,
            command,
        } => {
            let command: AssociationCommand = decode("association command", command)?;
            adapter.add_to(connection, &collection, &command).await?
        }
        Command::RemoveFrom {
            collection,
            command,
        } => {
            let command: AssociationCommand = decode("association command", command)?;
            adapter.remove_from(connection, &collection, &command).await?
        }
        Command::Request { method, url, data } => {
            let (body, response) = adapter.socket_request(connection, method, &url, data).await?;
            json!({ "statusCode": response.status_code, "body": body })
        }
    };
    Ok(output)
}

fn decode<T: DeserializeOwned>(what: &str, value: Value) -> anyhow::Result<T> {
    serde_json::from_value(value).with_context(|| format!("invalid {what}"))
}
