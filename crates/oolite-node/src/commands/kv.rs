//! Put and get commands.

use anyhow::{Context, Result};

use oolite_types::VersionVector;

use super::connect;

/// Read-merge-write: fold the key's current clocks into one context so the
/// new revision causally succeeds everything this node can see.
pub fn put(server: &str, key: &str, value: &str) -> Result<()> {
    let mut client = connect(server)?;
    let clocks: Vec<VersionVector> = client
        .get(key)
        .context("failed to read current context")?
        .into_iter()
        .map(|version| version.clock)
        .collect();
    let context = VersionVector::merge(clocks.iter());

    let clock = client
        .put(key, value.as_bytes().to_vec(), context)
        .context("put failed")?;
    println!("stored {key} @ {clock:?}");
    Ok(())
}

pub fn get(server: &str, key: &str) -> Result<()> {
    let mut client = connect(server)?;
    let versions = client.get(key).context("get failed")?;
    if versions.is_empty() {
        println!("(not found)");
        return Ok(());
    }
    if versions.len() > 1 {
        println!("{} concurrent revisions:", versions.len());
    }
    for version in versions {
        println!(
            "{} @ {:?}",
            String::from_utf8_lossy(&version.value),
            version.clock
        );
    }
    Ok(())
}
