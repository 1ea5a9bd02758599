//! Geocoding client configuration.

use serde::Deserialize;

use crate::census;

/// Settings for a [`GeocodingClient`](crate::GeocodingClient).
///
/// Missing keys take their [`Default`] values when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// When `false`, every lookup returns `None` without a request.
    pub enabled: bool,
    /// Geographies endpoint URL.
    pub base_url: String,
    /// Address range benchmark (e.g. `"Public_AR_Current"`).
    pub benchmark: String,
    /// Geography vintage (e.g. `"Current_Current"`).
    pub vintage: String,
    /// Minimum delay between requests in milliseconds.
    pub rate_limit_ms: u64,
    /// Maximum addresses handled per [`geocode_batch`](crate::GeocodingClient::geocode_batch) call.
    pub batch_size: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: census::DEFAULT_BASE_URL.to_string(),
            benchmark: census::DEFAULT_BENCHMARK.to_string(),
            vintage: census::DEFAULT_VINTAGE.to_string(),
            rate_limit_ms: 200,
            batch_size: 100,
            timeout_secs: 30,
        }
    }
}
