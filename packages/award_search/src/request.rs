//! Search filters and the `spending_by_award` request body.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::AwardSearchConfig;

/// Largest page the endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Columns requested for every award.
pub const FIELDS: &[&str] = &[
    "Award ID",
    "Recipient Name",
    "recipient_id",
    "Recipient UEI",
    "Start Date",
    "End Date",
    "Last Modified Date",
    "Award Amount",
    "Description",
    "Awarding Agency",
    "Awarding Sub Agency",
    "Contract Award Type",
    "Award Type",
    "Place of Performance City Code",
    "Place of Performance State Code",
    "Place of Performance Zip5",
    "Place of Performance Country Code",
    "NAICS",
    "PSC",
    "generated_internal_id",
];

/// Caller-supplied search criteria. Empty lists and `None` fall back to the
/// client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwardSearchFilter {
    pub naics_codes: Vec<String>,
    /// Awarding toptier agency names.
    pub agencies: Vec<String>,
    pub award_types: Vec<String>,
    pub lookback_days: Option<u32>,
}

impl AwardSearchFilter {
    /// Fills unset criteria from `config` and fixes the date window ending
    /// on `today`.
    #[must_use]
    pub fn resolve(&self, config: &AwardSearchConfig, today: NaiveDate) -> ResolvedFilter {
        let pick = |own: &[String], default: &[String]| {
            if own.is_empty() {
                default.to_vec()
            } else {
                own.to_vec()
            }
        };

        let lookback = self.lookback_days.unwrap_or(config.lookback_days);
        let earliest = NaiveDate::from_ymd_opt(2007, 10, 1).unwrap_or(NaiveDate::MIN);
        let start_date = today
            .checked_sub_days(Days::new(u64::from(lookback)))
            .unwrap_or(earliest)
            .max(earliest);

        ResolvedFilter {
            naics_codes: pick(&self.naics_codes, &config.naics_codes),
            agencies: pick(&self.agencies, &config.agencies),
            award_types: pick(&self.award_types, &config.award_type_codes),
            start_date,
            end_date: today,
        }
    }
}

/// A filter with every criterion decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilter {
    pub naics_codes: Vec<String>,
    pub agencies: Vec<String>,
    pub award_types: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ResolvedFilter {
    /// Builds the request body for one page.
    #[must_use]
    pub fn request(&self, page: u32, limit: u32) -> SearchRequest<'_> {
        SearchRequest {
            filters: SearchFilters {
                award_type_codes: &self.award_types,
                time_period: [TimePeriod {
                    start_date: self.start_date,
                    end_date: self.end_date,
                }],
                naics_codes: (!self.naics_codes.is_empty()).then_some(NaicsFilter {
                    require: &self.naics_codes,
                }),
                agencies: self
                    .agencies
                    .iter()
                    .map(|name| AgencyFilter {
                        kind: "awarding",
                        tier: "toptier",
                        name,
                    })
                    .collect(),
            },
            fields: FIELDS,
            page,
            limit,
            sort: "Award Amount",
            order: "desc",
            subawards: false,
        }
    }
}

/// Body of a `spending_by_award` request.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    filters: SearchFilters<'a>,
    fields: &'static [&'static str],
    page: u32,
    limit: u32,
    sort: &'static str,
    order: &'static str,
    subawards: bool,
}

impl SearchRequest<'_> {
    /// The 1-based page this request asks for.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }
}

#[derive(Debug, Clone, Serialize)]
struct SearchFilters<'a> {
    award_type_codes: &'a [String],
    time_period: [TimePeriod; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    naics_codes: Option<NaicsFilter<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    agencies: Vec<AgencyFilter<'a>>,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct TimePeriod {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct NaicsFilter<'a> {
    require: &'a [String],
}

#[derive(Debug, Clone, Copy, Serialize)]
struct AgencyFilter<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    tier: &'static str,
    name: &'a str,
}
