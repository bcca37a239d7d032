//! Config command - shows the effective merged configuration.

use anyhow::{Context, Result};

use oolite_config::ConfigLoader;

pub fn run(config_dir: Option<&str>) -> Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(dir) = config_dir {
        loader = loader.with_project_dir(dir);
    }
    let config = loader.load().context("failed to load configuration")?;
    // Validation errors should show up here, not at serve time.
    config.validate().context("invalid configuration")?;
    print!("{}", config.render()?);
    Ok(())
}
