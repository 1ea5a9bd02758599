#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! USAspending award search client.
//!
//! [`AwardSearchClient::search_awards`] walks the `spending_by_award`
//! endpoint page by page and yields normalized
//! [`UsaSpendingAwardRecord`]s as a lazy [`Stream`]. The walk stops when:
//!
//! 1. the page reports no further pages (or reports no metadata at all),
//! 2. `max_results` records have been yielded, or
//! 3. a page comes back empty, whatever its `hasNext` says.
//!
//! A failed page ends the stream with a single
//! [`AwardSearchError::Aborted`] item; records from earlier pages have
//! already been yielded. A stream that ends without an error item ran to
//! completion. [`AwardSearchClient::search_steps`] additionally marks a walk
//! cut short by `max_results`.

pub mod config;
pub mod request;

use std::time::Duration;

use chrono::Utc;
use futures::{Stream, StreamExt as _, future};
use govcon_enrichment_models::award::{SearchResponsePage, UsaSpendingAwardRecord};
use govcon_transport::{HttpTransport, Pacer, ReqwestTransport, TransportError};

pub use config::AwardSearchConfig;
pub use request::AwardSearchFilter;

use crate::request::{MAX_PAGE_SIZE, SearchRequest};

/// Errors that end an award search early.
#[derive(Debug, thiserror::Error)]
pub enum AwardSearchError {
    /// A page request failed; the rest of the walk was abandoned.
    #[error("award search aborted on page {page} after {yielded} records: {source}")]
    Aborted {
        /// The page that failed.
        page: u32,
        /// Records yielded before the failure.
        yielded: u64,
        /// The underlying failure.
        #[source]
        source: TransportError,
    },
}

/// One item of an award walk.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchStep {
    /// A normalized award.
    Award(UsaSpendingAwardRecord),
    /// `max_results` stopped the walk. Always the last item.
    Capped,
}

/// How a collected search ended.
#[derive(Debug)]
pub enum Completion {
    /// The client is disabled; no request was made.
    Disabled,
    /// The upstream ran out of pages (or returned an empty page).
    Exhausted,
    /// `max_results` was reached.
    Capped,
    /// A page failed; the awards collected so far are partial.
    Aborted(AwardSearchError),
}

/// Every award from one search plus how the walk ended.
#[derive(Debug)]
pub struct AwardSearchSummary {
    pub awards: Vec<UsaSpendingAwardRecord>,
    pub completion: Completion,
}

/// Rate-limited, paginating client for the award search endpoint.
#[derive(Debug)]
pub struct AwardSearchClient<T = ReqwestTransport> {
    config: AwardSearchConfig,
    transport: T,
    pacer: Pacer,
}

impl AwardSearchClient<ReqwestTransport> {
    /// Creates a client that talks to the configured endpoint over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the HTTP client cannot be built.
    pub fn new(config: AwardSearchConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: HttpTransport> AwardSearchClient<T> {
    /// Creates a client over an arbitrary transport.
    #[must_use]
    pub const fn with_transport(config: AwardSearchConfig, transport: T) -> Self {
        let pacer = Pacer::from_millis(config.rate_limit_ms);
        Self {
            config,
            transport,
            pacer,
        }
    }

    /// The client configuration.
    #[must_use]
    pub const fn config(&self) -> &AwardSearchConfig {
        &self.config
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Streams awards matching `filter`, starting from page 1.
    ///
    /// Nothing is requested until the stream is polled. Each call starts a
    /// fresh walk.
    pub fn search_awards<'a>(
        &'a self,
        filter: &AwardSearchFilter,
    ) -> impl Stream<Item = Result<UsaSpendingAwardRecord, AwardSearchError>> + Send + use<'a, T>
    {
        self.search_steps(filter).filter_map(|step| {
            future::ready(match step {
                Ok(SearchStep::Award(award)) => Some(Ok(award)),
                Ok(SearchStep::Capped) => None,
                Err(e) => Some(Err(e)),
            })
        })
    }

    /// Like [`search_awards`](Self::search_awards), but ends with a
    /// [`SearchStep::Capped`] marker when the walk stopped at `max_results`
    /// while more records may have been available.
    pub fn search_steps<'a>(
        &'a self,
        filter: &AwardSearchFilter,
    ) -> impl Stream<Item = Result<SearchStep, AwardSearchError>> + Send + use<'a, T> {
        let resolved = filter.resolve(&self.config, Utc::now().date_naive());
        let page_size = self.config.page_size.clamp(1, MAX_PAGE_SIZE);
        let max_results = self.config.max_results;

        async_stream::stream! {
            if !self.config.enabled {
                log::debug!("Award search disabled, skipping");
                return;
            }

            let fetched_at = Utc::now();
            let mut page: u32 = 1;
            let mut yielded: u64 = 0;

            loop {
                if yielded >= max_results {
                    log::info!("Award search reached limit of {max_results} records");
                    yield Ok(SearchStep::Capped);
                    break;
                }

                let response = match self.fetch_page(&resolved.request(page, page_size)).await {
                    Ok(response) => response,
                    Err(source) => {
                        log::warn!(
                            "Award search page {page} failed ({}), stopping after {yielded} records: {source}",
                            source.kind()
                        );
                        yield Err(AwardSearchError::Aborted { page, yielded, source });
                        break;
                    }
                };

                let has_more = response.has_more();
                let total = response.total_count();
                let awards = response.into_awards();

                log::info!(
                    "Award search page {page}: {} records (yielded: {yielded}, reported total: {total})",
                    awards.len()
                );

                if awards.is_empty() {
                    if has_more {
                        log::warn!("Award search page {page} was empty but claimed more pages, stopping");
                    }
                    break;
                }

                let mut truncated = false;
                for record in &awards {
                    if yielded >= max_results {
                        truncated = true;
                        break;
                    }
                    yield Ok(SearchStep::Award(UsaSpendingAwardRecord::from_record(record, fetched_at)));
                    yielded += 1;
                }

                if truncated {
                    log::info!("Award search reached limit of {max_results} records on page {page}");
                    yield Ok(SearchStep::Capped);
                    break;
                }
                if !has_more {
                    break;
                }
                page += 1;
            }
        }
    }

    /// Runs [`search_awards`](Self::search_awards) to the end and reports how
    /// it finished.
    pub async fn collect_awards(&self, filter: &AwardSearchFilter) -> AwardSearchSummary {
        if !self.config.enabled {
            return AwardSearchSummary {
                awards: Vec::new(),
                completion: Completion::Disabled,
            };
        }

        let mut steps = std::pin::pin!(self.search_steps(filter));
        let mut awards = Vec::new();
        let mut completion = Completion::Exhausted;

        while let Some(step) = steps.next().await {
            match step {
                Ok(SearchStep::Award(award)) => awards.push(award),
                Ok(SearchStep::Capped) => completion = Completion::Capped,
                Err(e) => {
                    return AwardSearchSummary {
                        awards,
                        completion: Completion::Aborted(e),
                    };
                }
            }
        }

        AwardSearchSummary { awards, completion }
    }

    async fn fetch_page(
        &self,
        request: &SearchRequest<'_>,
    ) -> Result<SearchResponsePage, TransportError> {
        self.pacer.pace().await;
        log::debug!("Requesting award search page {}", request.page());
        let body = self
            .transport
            .post_json(&self.config.base_url, request)
            .await?;
        govcon_transport::decode(&body)
    }
}
