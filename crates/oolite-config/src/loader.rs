//! Configuration loader with multi-source merging.

use std::env;
use std::path::{Path, PathBuf};

use crate::{ConfigError, OoliteConfig};

/// Name of the project-level configuration file.
pub const CONFIG_FILE: &str = "oolite.toml";

/// Builder-style loader: defaults, then `oolite.toml`, then `OOLITE_*`
/// environment variables.
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// Loader rooted at the current directory with the `OOLITE` prefix.
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "OOLITE".to_string(),
        }
    }

    /// Overrides the directory searched for [`CONFIG_FILE`].
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Overrides the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Merges all sources, lowest precedence first.
    pub fn load(self) -> Result<OoliteConfig, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&OoliteConfig::default())?);

        let project_file = self.project_dir.join(CONFIG_FILE);
        if project_file.exists() {
            builder = builder.add_source(
                config::File::from(project_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Double underscore separates nesting levels so snake_case field
        // names (bind_address) survive: OOLITE_NODE__BIND_ADDRESS.
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cluster.peers"),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .with_project_dir(dir.path())
            .with_env_prefix("OOLITE_TEST_NONE")
            .load()
            .unwrap();
        assert_eq!(config.node.id, "oolite-0");
        assert!(config.cluster.peers.is_empty());
    }

    #[test]
    fn project_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
[node]
id = "west-2"
bind_address = "10.0.0.2:7400"

[quorum]
write = 2
read = 2

[cluster]
peers = ["10.0.0.1:7400", "10.0.0.2:7400", "10.0.0.3:7400"]
"#,
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_project_dir(dir.path())
            .with_env_prefix("OOLITE_TEST_NONE")
            .load()
            .unwrap();
        assert_eq!(config.node.id, "west-2");
        assert_eq!(config.quorum.write, 2);
        assert_eq!(config.cluster.peers.len(), 3);

        let valid = config.validate().unwrap();
        assert_eq!(valid.bind_address.port, 7400);
        assert_eq!(valid.preference_list.len(), 3);
    }

    #[test]
    #[allow(unsafe_code)]
    fn environment_overrides_the_project_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[node]\nid = \"from-file\"\n").unwrap();

        // SAFETY: single-threaded within this test; the prefix is unique to
        // it, so no other test observes the variable.
        unsafe { env::set_var("OOLITE_ENVTEST_NODE__ID", "from-env") };
        let config = ConfigLoader::new()
            .with_project_dir(dir.path())
            .with_env_prefix("OOLITE_ENVTEST")
            .load()
            .unwrap();
        unsafe { env::remove_var("OOLITE_ENVTEST_NODE__ID") };

        assert_eq!(config.node.id, "from-env");
    }
}
