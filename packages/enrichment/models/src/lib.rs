#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Response shapes and flattened records for the external data enrichment
//! layer.
//!
//! Two families of types live here:
//!
//! - [`geocoding`] — the Census Bureau geographies response
//!   ([`geocoding::GeocoderResponse`] and its nested levels) and the flat
//!   [`geocoding::SimpleGeocodingResult`] the rest of the system consumes.
//! - [`award`] — one page of the USAspending award search response
//!   ([`award::SearchResponsePage`]) and the normalized
//!   [`award::UsaSpendingAwardRecord`].
//!
//! Every decoded field is optional. Fallback rules ("first row wins",
//! "first present column wins") live in small pure functions on the types so
//! decoding and extraction can be tested separately. Nothing in this crate
//! performs I/O.

pub mod award;
pub mod geocoding;

mod lenient;
