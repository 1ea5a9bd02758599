//! Enrichment configuration loading.
//!
//! Configuration comes from a TOML file with a `[geocoding]` and an
//! `[award_search]` table. Without a file, the copy embedded at compile time
//! from `config/enrichment.toml` is used.

use std::path::{Path, PathBuf};

use govcon_award_search::AwardSearchConfig;
use govcon_geocoder::GeocodingConfig;
use serde::Deserialize;

const EMBEDDED_CONFIG: &str = include_str!("../config/enrichment.toml");

/// Settings for both enrichment clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub geocoding: GeocodingConfig,
    pub award_search: AwardSearchConfig,
}

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`EnrichmentConfig`].
    #[error("invalid enrichment config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Loads configuration from `path`, or the embedded default when `None`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load(path: Option<&Path>) -> Result<EnrichmentConfig, ConfigError> {
    let Some(path) = path else {
        log::debug!("Using embedded enrichment config");
        return parse(EMBEDDED_CONFIG);
    };

    log::debug!("Loading enrichment config from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents)
}

/// Parses configuration from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Toml`] if the text is not a valid config.
pub fn parse(contents: &str) -> Result<EnrichmentConfig, ConfigError> {
    Ok(toml::from_str(contents)?)
}
