use std::path::Path;

use anyhow::Context;
use bucketfs_core::FsConfig;
use bucketfs_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Contents of the `--config` file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub store: StoreConfig,
    pub fs: FsConfig,
}

impl CliConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load the config file named on the command line, if any, then apply
    /// flag overrides.
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(root) = &cli.root {
            config.store.root = root.clone();
        }
        if let Some(bucket) = &cli.bucket {
            config.store.bucket = bucket.clone();
        }
        Ok(config)
    }
}
