use std::path::Path;

use config::Config as CConfig;
use serde::{Deserialize, Serialize};

use crate::{
    conf::{ReplicationConfig, SourceConfig},
    core::FrameError::{self, ConfigParsingError},
};

const ENV_PREFIX: &str = "PAGEFRAME";

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub replication: ReplicationConfig,
}

impl Config {
    pub fn from_str(toml_str: &str) -> Result<Config, FrameError> {
        Self::build(CConfig::builder().add_source(config::File::from_str(
            toml_str,
            config::FileFormat::Toml,
        )))
    }

    /// Load a TOML file, then apply `PAGEFRAME_<SECTION>__<KEY>` environment
    /// overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, FrameError> {
        let path = path.as_ref();
        Self::build(
            CConfig::builder()
                .add_source(config::File::from(path).format(config::FileFormat::Toml))
                .add_source(
                    config::Environment::with_prefix(ENV_PREFIX)
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Config, FrameError> {
        builder
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))
    }
}
