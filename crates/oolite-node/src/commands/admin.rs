//! Identity, gossip, and crash commands.

use anyhow::{Context, Result};

use super::connect;

pub fn identity(server: &str) -> Result<()> {
    let mut client = connect(server)?;
    let id = client.identity().context("identity failed")?;
    println!("{id}");
    Ok(())
}

pub fn gossip(server: &str) -> Result<()> {
    let mut client = connect(server)?;
    client.trigger_gossip().context("gossip failed")?;
    println!("gossip cycle complete");
    Ok(())
}

pub fn crash(server: &str, seconds: u64) -> Result<()> {
    let mut client = connect(server)?;
    client.crash(seconds).context("crash failed")?;
    println!("node crashed for {seconds}s");
    Ok(())
}
