#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding client for opportunity enrichment.
//!
//! Resolves free-text addresses to a point plus state, county, and census
//! tract FIPS codes using the [`census`] geographies endpoint.
//!
//! Lookups are best-effort: blank input, a disabled client, transport
//! failures, non-2xx responses, and unexpected bodies all come back as
//! `None` for that address. Requests from one client instance are spaced by
//! at least `rate_limit_ms`. No retries happen here.

pub mod census;
pub mod config;

use std::collections::BTreeMap;
use std::time::Duration;

use govcon_enrichment_models::geocoding::SimpleGeocodingResult;
use govcon_transport::{HttpTransport, Pacer, ReqwestTransport, TransportError};

pub use config::GeocodingConfig;

/// Outcome of one [`GeocodingClient::geocode_batch`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchGeocodeResult<'a> {
    /// Result per processed address; `None` when it could not be resolved.
    pub results: BTreeMap<String, Option<SimpleGeocodingResult>>,
    /// Addresses handled by this call, in input order (duplicates kept).
    pub processed: &'a [String],
    /// Addresses beyond the batch size, left for the next call.
    pub remaining: &'a [String],
}

impl<'a> BatchGeocodeResult<'a> {
    /// Each processed address paired with its result, in input order.
    pub fn in_input_order(
        &self,
    ) -> impl Iterator<Item = (&'a str, Option<&SimpleGeocodingResult>)> + '_ {
        self.processed.iter().map(|address| {
            (
                address.as_str(),
                self.results.get(address).and_then(Option::as_ref),
            )
        })
    }
}

/// Rate-limited client for the Census geographies endpoint.
#[derive(Debug)]
pub struct GeocodingClient<T = ReqwestTransport> {
    config: GeocodingConfig,
    transport: T,
    pacer: Pacer,
}

impl GeocodingClient<ReqwestTransport> {
    /// Creates a client that talks to the configured endpoint over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the HTTP client cannot be built.
    pub fn new(config: GeocodingConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: HttpTransport> GeocodingClient<T> {
    /// Creates a client over an arbitrary transport.
    #[must_use]
    pub const fn with_transport(config: GeocodingConfig, transport: T) -> Self {
        let pacer = Pacer::from_millis(config.rate_limit_ms);
        Self {
            config,
            transport,
            pacer,
        }
    }

    /// The client configuration.
    #[must_use]
    pub const fn config(&self) -> &GeocodingConfig {
        &self.config
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Geocodes one address.
    ///
    /// Returns `None` without a request when the client is disabled or the
    /// address is blank. A returned result may still fail
    /// [`SimpleGeocodingResult::is_valid`].
    pub async fn geocode_address(&self, address: &str) -> Option<SimpleGeocodingResult> {
        if !self.config.enabled {
            log::debug!("Geocoding disabled, skipping '{address}'");
            return None;
        }

        let address = address.trim();
        if address.is_empty() {
            return None;
        }

        match self.lookup(address).await {
            Ok(Some(result)) => Some(result),
            Ok(None) => {
                log::debug!("Census: no match for '{address}'");
                None
            }
            Err(e) => {
                log::warn!("Geocoding failed for '{address}' ({}): {e}", e.kind());
                None
            }
        }
    }

    /// Geocodes up to `batch_size` addresses, one request each, in input
    /// order.
    ///
    /// Addresses past the batch size are returned in
    /// [`BatchGeocodeResult::remaining`] untouched. Repeated addresses are
    /// looked up once.
    pub async fn geocode_batch<'a>(&self, addresses: &'a [String]) -> BatchGeocodeResult<'a> {
        let take = self.config.batch_size.max(1).min(addresses.len());
        let (processed, remaining) = addresses.split_at(take);

        let mut results = BTreeMap::new();
        for address in processed {
            if results.contains_key(address) {
                continue;
            }
            let result = self.geocode_address(address).await;
            results.insert(address.clone(), result);
        }

        let matched = results.values().filter(|r| r.is_some()).count();
        log::info!(
            "Geocoded batch: {matched}/{} matched, {} remaining",
            results.len(),
            remaining.len()
        );

        BatchGeocodeResult {
            results,
            processed,
            remaining,
        }
    }

    async fn lookup(&self, address: &str) -> Result<Option<SimpleGeocodingResult>, TransportError> {
        let params = census::query_params(address, &self.config.benchmark, &self.config.vintage);

        self.pacer.pace().await;
        let body = self
            .transport
            .get_text(&self.config.base_url, &params)
            .await?;

        census::parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::Instant;

    use super::*;

    /// Replays canned bodies and records every query it receives.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String, TransportError>>>,
        queries: Mutex<Vec<Vec<(String, String)>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<String, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpTransport for ScriptedTransport {
        async fn get_text(
            &self,
            _url: &str,
            query: &[(&str, &str)],
        ) -> Result<String, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(
                query
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            );
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(no_match()))
        }

        async fn post_json<B: serde::Serialize + Sync>(
            &self,
            _url: &str,
            _body: &B,
        ) -> Result<String, TransportError> {
            panic!("geocoder never POSTs")
        }
    }

    fn no_match() -> String {
        serde_json::json!({ "result": { "addressMatches": [] } }).to_string()
    }

    fn white_house() -> String {
        serde_json::json!({
            "result": {
                "input": { "address": { "address": "1600 Pennsylvania Ave NW, Washington, DC, 20500" } },
                "addressMatches": [{
                    "matchedAddress": "1600 PENNSYLVANIA AVE NW, WASHINGTON, DC, 20500",
                    "coordinates": { "x": -77.0369, "y": 38.9072 },
                    "addressComponents": { "city": "WASHINGTON", "state": "DC", "zip": "20500" },
                    "geographies": {
                        "States": [{ "GEOID": "11", "STATE": "11" }],
                        "Counties": [{ "GEOID": "11001", "STATE": "11", "COUNTY": "001" }],
                        "Census Tracts": [{ "GEOID": "11001000100", "STATE": "11", "COUNTY": "001", "TRACT": "000100" }]
                    }
                }]
            }
        })
        .to_string()
    }

    fn config() -> GeocodingConfig {
        GeocodingConfig {
            rate_limit_ms: 200,
            ..GeocodingConfig::default()
        }
    }

    fn client(responses: Vec<Result<String, TransportError>>) -> GeocodingClient<ScriptedTransport> {
        GeocodingClient::with_transport(config(), ScriptedTransport::new(responses))
    }

    #[tokio::test]
    async fn geocodes_white_house() {
        let client = client(vec![Ok(white_house())]);

        let result = client
            .geocode_address("1600 Pennsylvania Ave NW, Washington, DC, 20500")
            .await
            .unwrap();

        assert_eq!(result.state_fips.as_deref(), Some("11"));
        assert_eq!(result.county_fips.as_deref(), Some("11001"));
        assert_eq!(result.census_tract.as_deref(), Some("000100"));
        assert!((result.latitude.unwrap() - 38.9072).abs() < 1e-6);
        assert!((result.longitude.unwrap() - -77.0369).abs() < 1e-6);
        assert!(result.is_valid());
    }

    #[tokio::test]
    async fn sends_address_benchmark_and_vintage() {
        let client = client(vec![Ok(no_match())]);
        client.geocode_address("  100 Main St, Springfield, IL  ").await;

        let queries = client.transport().queries.lock().unwrap();
        let query = &queries[0];
        assert!(query.contains(&("address".to_string(), "100 Main St, Springfield, IL".to_string())));
        assert!(query.contains(&("benchmark".to_string(), "Public_AR_Current".to_string())));
        assert!(query.contains(&("vintage".to_string(), "Current_Current".to_string())));
    }

    #[tokio::test]
    async fn blank_address_makes_no_request() {
        let client = client(Vec::new());

        for blank in ["", "   ", "\t\n"] {
            assert!(client.geocode_address(blank).await.is_none());
        }
        assert_eq!(client.transport().calls(), 0);
    }

    #[tokio::test]
    async fn disabled_client_makes_no_request() {
        let config = GeocodingConfig {
            enabled: false,
            ..config()
        };
        let client = GeocodingClient::with_transport(config, ScriptedTransport::new(vec![Ok(white_house())]));

        assert!(client.geocode_address("1600 Pennsylvania Ave NW").await.is_none());
        assert!(client.geocode_address("").await.is_none());

        let addresses = vec!["a".to_string(), "b".to_string()];
        let batch = client.geocode_batch(&addresses).await;
        assert!(batch.results.values().all(Option::is_none));
        assert_eq!(client.transport().calls(), 0);
    }

    #[tokio::test]
    async fn no_match_is_none() {
        let client = client(vec![Ok(no_match())]);
        assert!(client.geocode_address("nowhere").await.is_none());
        assert_eq!(client.transport().calls(), 1);
    }

    #[tokio::test]
    async fn failures_are_absorbed() {
        let client = client(vec![
            Err(TransportError::Status {
                status: 502,
                url: census::DEFAULT_BASE_URL.to_string(),
            }),
            Ok("<html>Bad Gateway</html>".to_string()),
            Ok(serde_json::json!({ "result": "unexpected" }).to_string()),
        ]);

        assert!(client.geocode_address("a").await.is_none());
        assert!(client.geocode_address("b").await.is_none());
        assert!(client.geocode_address("c").await.is_none());
        assert_eq!(client.transport().calls(), 3);
    }

    #[tokio::test]
    async fn match_without_coordinates_is_returned_but_invalid() {
        let body = serde_json::json!({
            "result": { "addressMatches": [{ "matchedAddress": "SOMEWHERE" }] }
        })
        .to_string();
        let client = client(vec![Ok(body)]);

        let result = client.geocode_address("somewhere").await.unwrap();
        assert!(!result.is_valid());
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_requests_are_paced() {
        let client = client(vec![Ok(no_match()), Ok(no_match()), Ok(no_match())]);

        let start = Instant::now();
        client.geocode_address("a").await;
        client.geocode_address("b").await;
        client.geocode_address("c").await;

        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_does_not_consume_pacing() {
        let client = client(vec![Ok(no_match())]);

        let start = Instant::now();
        client.geocode_address("").await;
        client.geocode_address("a").await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn batch_is_bounded_by_batch_size() {
        let config = GeocodingConfig {
            batch_size: 2,
            rate_limit_ms: 0,
            ..GeocodingConfig::default()
        };
        let client = GeocodingClient::with_transport(
            config,
            ScriptedTransport::new(vec![Ok(white_house()), Ok(no_match())]),
        );
        let addresses: Vec<String> = ["white house", "nowhere", "later"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let batch = client.geocode_batch(&addresses).await;

        assert_eq!(batch.results.len(), 2);
        assert!(batch.results["white house"].is_some());
        assert!(batch.results["nowhere"].is_none());
        assert_eq!(batch.processed, &addresses[..2]);
        assert_eq!(batch.remaining, ["later".to_string()]);
        assert_eq!(client.transport().calls(), 2);
    }

    #[tokio::test]
    async fn batch_results_follow_input_order() {
        let config = GeocodingConfig {
            rate_limit_ms: 0,
            ..GeocodingConfig::default()
        };
        let client = GeocodingClient::with_transport(
            config,
            ScriptedTransport::new(vec![Ok(no_match()), Ok(white_house())]),
        );
        let addresses: Vec<String> = ["zzz nowhere", "1600 pennsylvania ave", "zzz nowhere"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let batch = client.geocode_batch(&addresses).await;
        let ordered: Vec<_> = batch
            .in_input_order()
            .map(|(address, result)| (address, result.is_some()))
            .collect();

        assert_eq!(
            ordered,
            [
                ("zzz nowhere", false),
                ("1600 pennsylvania ave", true),
                ("zzz nowhere", false),
            ]
        );
        assert_eq!(client.transport().calls(), 2);
    }

    #[tokio::test]
    async fn batch_survives_failures_and_dedupes() {
        let config = GeocodingConfig {
            rate_limit_ms: 0,
            ..GeocodingConfig::default()
        };
        let client = GeocodingClient::with_transport(
            config,
            ScriptedTransport::new(vec![
                Err(TransportError::Status {
                    status: 500,
                    url: String::new(),
                }),
                Ok(white_house()),
            ]),
        );
        let addresses: Vec<String> = ["broken", "white house", "broken", " "]
            .iter()
            .map(ToString::to_string)
            .collect();

        let batch = client.geocode_batch(&addresses).await;

        assert_eq!(batch.results.len(), 3);
        assert!(batch.results["broken"].is_none());
        assert!(batch.results["white house"].as_ref().unwrap().is_valid());
        assert!(batch.results[" "].is_none());
        assert!(batch.remaining.is_empty());
        assert_eq!(client.transport().calls(), 2);
    }

    #[tokio::test]
    async fn empty_batch() {
        let client = client(Vec::new());
        let batch = client.geocode_batch(&[]).await;
        assert!(batch.results.is_empty());
        assert!(batch.remaining.is_empty());
        assert_eq!(client.transport().calls(), 0);
    }
}
