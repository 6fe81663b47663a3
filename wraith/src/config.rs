//! The runner's config file. It is a superset of the core's [`phantom::Config`], so a file that
//! only configures the machines is also a valid runner config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// The most instructions a run will execute before giving up on the program halting.
    #[serde(default)]
    pub ticks: Option<u64>,
    /// Render the display once the run is over.
    #[serde(default)]
    pub screen: bool,
    #[serde(flatten)]
    pub machine: phantom::Config,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl RunnerConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }
}
