//! Connection definitions loaded from a JSON file.
//!
//! ```json
//! { "connections": { "default": { "host": "localhost", "port": 1337,
//!                                 "collections": { "pet": { ... } } } } }
//! ```
//!
//! Each key under `connections` becomes the connection's identity. A missing
//! file means one `default` connection with default settings.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use connection::ConnectionDefinition;
use serde::Deserialize;

pub const DEFAULT_CONNECTION: &str = "default";

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    connections: BTreeMap<String, ConnectionDefinition>,
}

pub fn load(path: &Path) -> anyhow::Result<Vec<ConnectionDefinition>> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse(&text).with_context(|| format!("invalid config file {}", path.display())),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file; using the default connection");
            Ok(vec![default_definition()])
        }
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

pub fn parse(text: &str) -> anyhow::Result<Vec<ConnectionDefinition>> {
    let file: ConfigFile = serde_json::from_str(text)?;
    Ok(file
        .connections
        .into_iter()
        .map(|(identity, mut definition)| {
            definition.identity = Some(identity);
            definition
        })
        .collect())
}

fn default_definition() -> ConnectionDefinition {
    ConnectionDefinition {
        identity: Some(DEFAULT_CONNECTION.to_owned()),
        ..ConnectionDefinition::default()
    }
}
