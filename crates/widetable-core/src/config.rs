//! Keyspace configuration loaded from TOML.
//!
//! ```toml
//! keyspace = "app"
//! debug = true
//!
//! [defaults]
//! compact_storage = true
//! compressor = "lz4"
//! ```

use crate::db::options::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("keyspace name must not be empty")]
    EmptyKeyspace,

    #[error("invalid keyspace config: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// KeySpaceConfig
///
/// `defaults` become the base options of every table built from the
/// configured keyspace.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeySpaceConfig {
    pub keyspace: String,
    pub debug: bool,
    pub defaults: Options,
}

impl KeySpaceConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keyspace.trim().is_empty() {
            return Err(ConfigError::EmptyKeyspace);
        }

        Ok(())
    }
}

///
/// TESTS
///
