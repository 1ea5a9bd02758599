//! US Census Bureau geographies endpoint.
//!
//! `GET /geocoder/geographies/onelineaddress` resolves a one-line address
//! to a point plus the state, county, and tract it falls in. No API key
//! required.
//!
//! See <https://geocoding.geo.census.gov/geocoder/Geocoding_Services_API.html>

use govcon_enrichment_models::geocoding::{GeocoderResponse, SimpleGeocodingResult};
use govcon_transport::TransportError;

/// Geographies lookup for a one-line address.
pub const DEFAULT_BASE_URL: &str =
    "https://geocoding.geo.census.gov/geocoder/geographies/onelineaddress";

/// Most recent address range benchmark.
pub const DEFAULT_BENCHMARK: &str = "Public_AR_Current";

/// Geography vintage matching [`DEFAULT_BENCHMARK`].
pub const DEFAULT_VINTAGE: &str = "Current_Current";

/// Builds the query string for a one-line address lookup.
#[must_use]
pub fn query_params<'a>(
    address: &'a str,
    benchmark: &'a str,
    vintage: &'a str,
) -> [(&'static str, &'a str); 4] {
    [
        ("address", address),
        ("benchmark", benchmark),
        ("vintage", vintage),
        ("format", "json"),
    ]
}

/// Parses a geographies response and flattens its best match.
///
/// Returns `Ok(None)` when nothing matched or the request was rejected.
///
/// # Errors
///
/// Returns [`TransportError::Decode`] if the body is not a geocoder response.
pub fn parse_response(body: &str) -> Result<Option<SimpleGeocodingResult>, TransportError> {
    let response: GeocoderResponse = govcon_transport::decode(body)?;

    for error in &response.errors {
        log::warn!("Census geocoder rejected request: {error}");
    }

    let Some(result) = response.result.filter(|r| r.has_matches()) else {
        return Ok(None);
    };

    let best = result.best_match();
    if let Some(count) = result.address_matches.as_ref().map(Vec::len)
        && count > 1
    {
        log::debug!("Census geocoder returned {count} candidates, using the first");
    }
    if best.is_some_and(|m| !m.coordinates.is_some_and(|c| c.is_complete())) {
        log::debug!("Best Census match has incomplete coordinates");
    }

    Ok(SimpleGeocodingResult::from_best(best))
}
