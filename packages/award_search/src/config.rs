//! Award search client configuration.

use serde::Deserialize;

/// Settings for an [`AwardSearchClient`](crate::AwardSearchClient).
///
/// Missing keys take their [`Default`] values when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AwardSearchConfig {
    /// When `false`, every search yields nothing without a request.
    pub enabled: bool,
    /// `spending_by_award` endpoint URL.
    pub base_url: String,
    /// Minimum delay between page requests in milliseconds.
    pub rate_limit_ms: u64,
    /// Records per page (clamped to 1..=100).
    pub page_size: u32,
    /// Maximum records yielded across all pages of one search.
    pub max_results: u64,
    /// Award type codes used when a filter does not name any.
    pub award_type_codes: Vec<String>,
    /// Trailing window in days used when a filter does not set one.
    pub lookback_days: u32,
    /// NAICS allowlist used when a filter does not name any codes.
    pub naics_codes: Vec<String>,
    /// Awarding agency allowlist used when a filter does not name any.
    pub agencies: Vec<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AwardSearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.usaspending.gov/api/v2/search/spending_by_award/".to_string(),
            rate_limit_ms: 250,
            page_size: 100,
            max_results: 1000,
            // A-D: BPA call, purchase order, delivery order, definitive contract.
            award_type_codes: ["A", "B", "C", "D"].map(String::from).to_vec(),
            lookback_days: 365,
            naics_codes: Vec::new(),
            agencies: Vec::new(),
            timeout_secs: 60,
        }
    }
}
