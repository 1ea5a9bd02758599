//! Census Bureau geographies response and the flattened geocoding result.
//!
//! The `geographies/onelineaddress` endpoint answers with:
//!
//! ```text
//! { "result": { "input": {...}, "addressMatches": [ {
//!     "matchedAddress": "...",
//!     "coordinates": { "x": lng, "y": lat },
//!     "tigerLine": {...}, "addressComponents": {...},
//!     "geographies": { "States": [...], "Counties": [...], "Census Tracts": [...] }
//! } ] } }
//! ```
//!
//! See <https://geocoding.geo.census.gov/geocoder/Geocoding_Services_API.html>

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::lenient::{null_as_default, string_list};

/// Geography level holding state rows.
pub const STATES_LEVEL: &str = "States";
/// Geography level holding county rows.
pub const COUNTIES_LEVEL: &str = "Counties";
/// Geography level holding census tract rows.
pub const CENSUS_TRACTS_LEVEL: &str = "Census Tracts";

/// Top-level envelope of a geocoder response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeocoderResponse {
    /// The geocoding result, absent when the request was rejected.
    pub result: Option<GeocoderResult>,
    /// Error strings reported for rejected parameters.
    #[serde(default, deserialize_with = "string_list")]
    pub errors: Vec<String>,
}

/// The geocoding result: an echo of the input plus ranked candidate matches.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocoderResult {
    /// Echo of the request parameters.
    pub input: Option<GeocoderInput>,
    /// Candidate matches in the geocoder's own ranking order.
    pub address_matches: Option<Vec<AddressMatch>>,
}

impl GeocoderResult {
    /// Whether at least one candidate match was returned.
    #[must_use]
    pub fn has_matches(&self) -> bool {
        self.address_matches.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Returns the first candidate match.
    ///
    /// The upstream ranking is trusted as-is; no re-ranking happens here.
    #[must_use]
    pub fn best_match(&self) -> Option<&AddressMatch> {
        self.address_matches.as_ref().and_then(|m| m.first())
    }
}

/// Echo of the request parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeocoderInput {
    /// The address as received.
    pub address: Option<InputAddress>,
    /// The benchmark the request was resolved against.
    pub benchmark: Option<NamedRelease>,
    /// The vintage the geographies were taken from.
    pub vintage: Option<NamedRelease>,
}

impl GeocoderInput {
    /// The echoed one-line address, if any.
    #[must_use]
    pub fn address_line(&self) -> Option<&str> {
        self.address.as_ref()?.address.as_deref()
    }
}

/// Echoed one-line address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InputAddress {
    /// The address string.
    pub address: Option<String>,
}

/// A benchmark or vintage descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NamedRelease {
    /// Benchmark name (e.g. `"Public_AR_Current"`).
    #[serde(rename = "benchmarkName")]
    pub benchmark_name: Option<String>,
    /// Vintage name (e.g. `"Current_Current"`).
    #[serde(rename = "vintageName")]
    pub vintage_name: Option<String>,
}

/// One candidate match for an address.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressMatch {
    /// Canonical form of the matched address.
    pub matched_address: Option<String>,
    /// Interpolated point on the matched street segment.
    pub coordinates: Option<Coordinates>,
    /// TIGER/Line segment reference.
    pub tiger_line: Option<TigerLine>,
    /// Parsed address parts. Display only.
    pub address_components: Option<AddressComponents>,
    /// Geography rows keyed by level name (`"States"`, `"Counties"`, ...).
    #[serde(default, deserialize_with = "geography_levels")]
    pub geographies: BTreeMap<String, Vec<Geography>>,
}

impl AddressMatch {
    /// Returns the first row of a geography level.
    #[must_use]
    pub fn first_geography(&self, level: &str) -> Option<&Geography> {
        self.geographies.get(level).and_then(|rows| rows.first())
    }

    /// State FIPS code from the first `"States"` row.
    #[must_use]
    pub fn state_fips(&self) -> Option<String> {
        self.first_geography(STATES_LEVEL)?.state.clone()
    }

    /// Five-digit county FIPS code (state + county) from the first
    /// `"Counties"` row.
    #[must_use]
    pub fn county_fips(&self) -> Option<String> {
        let county = self.first_geography(COUNTIES_LEVEL)?;
        match (&county.state, &county.county) {
            (Some(state), Some(county)) => Some(format!("{state}{county}")),
            _ => None,
        }
    }

    /// Tract code from the first `"Census Tracts"` row.
    #[must_use]
    pub fn census_tract(&self) -> Option<String> {
        self.first_geography(CENSUS_TRACTS_LEVEL)?.tract.clone()
    }
}

/// A point in WGS84.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Coordinates {
    /// Longitude.
    #[serde(rename = "x")]
    pub longitude: Option<f64>,
    /// Latitude.
    #[serde(rename = "y")]
    pub latitude: Option<f64>,
}

impl Coordinates {
    /// Whether both axes are present.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.longitude.is_some() && self.latitude.is_some()
    }
}

/// TIGER/Line reference for the matched segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TigerLine {
    /// TIGER/Line segment id.
    pub tiger_line_id: Option<String>,
    /// Side of the street (`"L"` or `"R"`).
    pub side: Option<String>,
}

/// Structured parts of the matched address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponents {
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub pre_qualifier: Option<String>,
    pub pre_direction: Option<String>,
    pub pre_type: Option<String>,
    pub street_name: Option<String>,
    pub suffix_type: Option<String>,
    pub suffix_direction: Option<String>,
    pub suffix_qualifier: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// One row of a geography level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Geography {
    #[serde(rename = "GEOID", alias = "geoId")]
    pub geo_id: Option<String>,
    #[serde(rename = "NAME", alias = "name")]
    pub name: Option<String>,
    /// State FIPS code.
    #[serde(rename = "STATE", alias = "state")]
    pub state: Option<String>,
    /// County FIPS code (without the state prefix).
    #[serde(rename = "COUNTY", alias = "county")]
    pub county: Option<String>,
    /// Tract code.
    #[serde(rename = "TRACT", alias = "tract")]
    pub tract: Option<String>,
}

fn geography_levels<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<Geography>>, D::Error>
where
    D: Deserializer<'de>,
{
    let levels: BTreeMap<String, Option<Vec<Geography>>> = null_as_default(deserializer)?;
    Ok(levels
        .into_iter()
        .map(|(level, rows)| (level, rows.unwrap_or_default()))
        .collect())
}

/// The flat geocoding result consumed by the rest of the system.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleGeocodingResult {
    pub matched_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub state_fips: Option<String>,
    pub county_fips: Option<String>,
    pub census_tract: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

impl SimpleGeocodingResult {
    /// Reduces an optional best match; `None` in, `None` out.
    #[must_use]
    pub fn from_best(best: Option<&AddressMatch>) -> Option<Self> {
        best.map(Self::from)
    }

    /// A result is usable when both latitude and longitude are present.
    /// No other field affects validity.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

impl From<&AddressMatch> for SimpleGeocodingResult {
    fn from(m: &AddressMatch) -> Self {
        let coordinates = m.coordinates.unwrap_or_default();
        let components = m.address_components.as_ref();

        Self {
            matched_address: m.matched_address.clone(),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            state_fips: m.state_fips(),
            county_fips: m.county_fips(),
            census_tract: m.census_tract(),
            city: components.and_then(|c| c.city.clone()),
            state: components.and_then(|c| c.state.clone()),
            zip: components.and_then(|c| c.zip.clone()),
        }
    }
}
