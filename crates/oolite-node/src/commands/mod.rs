//! Command implementations.

pub mod admin;
pub mod config;
pub mod kv;
pub mod serve;

use anyhow::{Context, Result};
use oolite_client::Client;
use oolite_types::NodeAddress;

/// Parses `host:port` and opens a client connection.
fn connect(server: &str) -> Result<Client> {
    let address: NodeAddress = server
        .parse()
        .with_context(|| format!("invalid server address '{server}'"))?;
    Client::connect(&address).with_context(|| format!("failed to connect to {address}"))
}
