use std::path::PathBuf;

use config::{Config as CConfig, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{
    conf::{CouchConfig, MongoConfig, WorkloadConfig},
    core::BenchError::{self, ConfigParsingError},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    #[serde(default = "DatasetConfig::default_path")]
    pub path: PathBuf,
}

impl DatasetConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("diplomas-expedidos.json")
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub mongodb: MongoConfig,
    #[serde(default)]
    pub couchdb: CouchConfig,
    #[serde(default)]
    pub workload: WorkloadConfig,
}

const ENV_PREFIX: &str = "DOCBENCH";

impl Config {
    pub fn from_str(toml_str: &str) -> Result<Config, BenchError> {
        let config = CConfig::builder()
            .add_source(File::from_str(toml_str, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        config.workload.validate()?;
        Ok(config)
    }

    /// Load from an optional TOML file, then apply `DOCBENCH_*` overrides
    /// (`DOCBENCH_MONGODB__PORT=27018`).
    pub fn load(path: Option<&str>) -> Result<Config, BenchError> {
        let mut builder = CConfig::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        config.workload.validate()?;
        Ok(config)
    }
}
