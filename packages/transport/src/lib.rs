#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Transport layer shared by the enrichment clients.
//!
//! Provides the [`HttpTransport`] seam (with a [`ReqwestTransport`]
//! implementation), the per-instance [`Pacer`] used for rate limiting, and
//! [`TransportError`], which classifies every failure a client has to absorb.
//!
//! Nothing here retries. A failed request is reported once and the caller
//! decides what "no data" means for it.

pub mod http;
pub mod pacer;

use serde::Serialize;
use serde::de::DeserializeOwned;
use strum_macros::{AsRefStr, Display};

pub use http::ReqwestTransport;
pub use pacer::Pacer;

/// Errors from a single outbound request.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or the body could not be read
    /// (timeout, connection failure, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The body was not the expected JSON shape.
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Coarse classification of a [`TransportError`], used in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// Timeout, connection, or body read failure.
    Transport,
    /// Non-2xx response.
    Status,
    /// Unparseable or unexpected body.
    Decode,
}

impl TransportError {
    /// Returns the failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Http(_) => FailureKind::Transport,
            Self::Status { .. } => FailureKind::Status,
            Self::Decode(_) => FailureKind::Decode,
        }
    }
}

/// Issues requests and returns the body of 2xx responses as text.
///
/// Implementations must map non-2xx responses to
/// [`TransportError::Status`].
pub trait HttpTransport: Send + Sync {
    /// Sends a `GET` with the given query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails or the status is not
    /// 2xx.
    fn get_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> impl std::future::Future<Output = Result<String, TransportError>> + Send;

    /// Sends a `POST` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails or the status is not
    /// 2xx.
    fn post_json<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> impl std::future::Future<Output = Result<String, TransportError>> + Send;
}

/// Decodes a response body.
///
/// # Errors
///
/// Returns [`TransportError::Decode`] if the body does not match `T`.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, TransportError> {
    Ok(serde_json::from_str(body)?)
}
