//! Serve command - runs a replica node in the foreground.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use oolite_client::TcpDialer;
use oolite_config::ConfigLoader;
use oolite_replica::{NodeConfig, ReplicaNode};
use oolite_server::Server;

pub fn run(config_dir: Option<&str>) -> Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(dir) = config_dir {
        loader = loader.with_project_dir(dir);
    }
    let config = loader.load().context("failed to load configuration")?;
    let valid = config.validate().context("invalid configuration")?;

    info!(id = %valid.id, address = %valid.bind_address, "starting node");
    println!();
    println!("Oolite - peer-replicated key-value store");
    println!();
    println!("  Node id:       {}", valid.id);
    println!("  Bind address:  {}", valid.bind_address);
    println!(
        "  Quorums:       W={} R={} over {} replicas",
        valid.quorum.write,
        valid.quorum.read,
        valid.preference_list.len()
    );

    let node = Arc::new(ReplicaNode::new(
        NodeConfig {
            id: valid.id,
            address: valid.bind_address.clone(),
            quorum: valid.quorum,
        },
        Arc::new(TcpDialer::default()),
    ));
    node.set_preference_list(valid.preference_list)
        .context("failed to install preference list")?;

    let server = Server::bind(node, &valid.bind_address).context("failed to bind listener")?;
    println!("  Listening on:  {}", server.address());
    println!();
    server.run().context("server terminated")?;
    Ok(())
}
