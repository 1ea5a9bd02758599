//! USAspending award search page and the normalized award record.
//!
//! Wire keys follow the `POST /api/v2/search/spending_by_award/` response,
//! which names columns by their display label (`"Award ID"`,
//! `"Recipient Name"`, ...).
//!
//! See <https://api.usaspending.gov/docs/endpoints>

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::lenient::{decimal, null_as_default, string_list};

/// Award type labels that identify a contract award.
pub const CONTRACT_AWARD_TYPES: &[&str] = &["Definitive Contract", "IDV"];

/// One page of award search results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponsePage {
    #[serde(default, deserialize_with = "award_records")]
    results: Vec<AwardRecord>,
    /// Pagination state, when reported.
    pub page_metadata: Option<PageMetadata>,
    /// Informational messages from the API.
    #[serde(default, deserialize_with = "string_list")]
    pub messages: Vec<String>,
}

impl SearchResponsePage {
    /// The records on this page. Empty when the result list was absent or
    /// `null`.
    #[must_use]
    pub fn awards(&self) -> &[AwardRecord] {
        &self.results
    }

    /// Consumes the page, returning its records.
    #[must_use]
    pub fn into_awards(self) -> Vec<AwardRecord> {
        self.results
    }

    /// Whether the upstream claims another page exists.
    ///
    /// Without metadata the answer is `false`: stopping is preferred over
    /// looping on unknown state.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.page_metadata.as_ref().is_some_and(|m| m.has_next)
    }

    /// The reported total, or this page's record count when no total was
    /// reported. The fallback is an estimate only.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.page_metadata
            .as_ref()
            .and_then(|m| m.total)
            .unwrap_or(self.results.len() as u64)
    }
}

/// Decodes the result list record by record, dropping records that do not
/// decode instead of failing the whole page.
fn award_records<'de, D>(deserializer: D) -> Result<Vec<AwardRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();

    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping malformed award record at index {index}: {e}");
                None
            }
        })
        .collect())
}

/// Pagination state reported alongside a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Current page number (1-based).
    pub page: Option<u32>,
    /// Total matching records, when the endpoint reports it.
    pub total: Option<u64>,
    /// Page size limit.
    pub limit: Option<u32>,
    /// Next page number.
    pub next: Option<u32>,
    /// Previous page number.
    pub previous: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_next: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_previous: bool,
}

/// A code/description pair (NAICS, PSC).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CodeDescription {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// A NAICS/PSC column, sent either as an object or as a bare code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CodeField {
    /// `{"code": "541512", "description": "..."}`
    Described(CodeDescription),
    /// `"541512"`
    Bare(String),
}

impl CodeField {
    fn code(&self) -> Option<&str> {
        match self {
            Self::Described(d) => d.code.as_deref(),
            Self::Bare(code) => Some(code),
        }
    }

    fn description(&self) -> Option<&str> {
        match self {
            Self::Described(d) => d.description.as_deref(),
            Self::Bare(_) => None,
        }
    }
}

/// One award row as returned by the search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AwardRecord {
    pub internal_id: Option<u64>,
    pub generated_internal_id: Option<String>,
    #[serde(rename = "Award ID")]
    pub award_id: Option<String>,
    #[serde(rename = "Recipient Name")]
    pub recipient_name: Option<String>,
    pub recipient_id: Option<String>,
    #[serde(rename = "Recipient UEI")]
    pub recipient_uei: Option<String>,
    #[serde(rename = "Start Date")]
    pub start_date: Option<String>,
    #[serde(rename = "End Date")]
    pub end_date: Option<String>,
    #[serde(rename = "Last Modified Date")]
    pub last_modified_date: Option<String>,
    #[serde(rename = "Award Amount", default, deserialize_with = "decimal")]
    pub award_amount: Option<Decimal>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Awarding Agency")]
    pub awarding_agency: Option<String>,
    #[serde(rename = "Awarding Sub Agency")]
    pub awarding_sub_agency: Option<String>,
    #[serde(rename = "Contract Award Type")]
    pub contract_award_type: Option<String>,
    #[serde(rename = "Award Type")]
    pub award_type: Option<String>,
    #[serde(rename = "Place of Performance City Code")]
    pub pop_city: Option<String>,
    #[serde(rename = "Place of Performance State Code")]
    pub pop_state: Option<String>,
    #[serde(rename = "Place of Performance Zip5")]
    pub pop_zip: Option<String>,
    #[serde(rename = "Place of Performance Country Code")]
    pub pop_country: Option<String>,
    #[serde(rename = "NAICS")]
    pub naics: Option<CodeField>,
    #[serde(rename = "NAICS Code")]
    pub naics_code: Option<String>,
    #[serde(rename = "NAICS Description")]
    pub naics_description: Option<String>,
    #[serde(rename = "PSC")]
    pub psc: Option<CodeField>,
    #[serde(rename = "PSC Code")]
    pub psc_code: Option<String>,
    #[serde(rename = "PSC Description")]
    pub psc_description: Option<String>,
}

/// A normalized external award.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsaSpendingAwardRecord {
    pub award_id: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_id: Option<String>,
    pub recipient_uei: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub award_amount: Option<Decimal>,
    pub description: Option<String>,
    pub awarding_agency: Option<String>,
    pub awarding_sub_agency: Option<String>,
    pub award_type: Option<String>,
    pub pop_city: Option<String>,
    pub pop_state: Option<String>,
    pub pop_zip: Option<String>,
    pub pop_country: Option<String>,
    pub naics_code: Option<String>,
    pub naics_description: Option<String>,
    pub psc_code: Option<String>,
    pub psc_description: Option<String>,
    /// Identifier used when the upstream award id is missing. Never empty.
    pub fallback_id: String,
    /// Upstream last-modified date.
    pub last_modified: Option<NaiveDate>,
    /// When this record was produced.
    pub fetched_at: DateTime<Utc>,
}

impl UsaSpendingAwardRecord {
    /// Reduces a decoded row to the normalized record.
    #[must_use]
    pub fn from_record(record: &AwardRecord, fetched_at: DateTime<Utc>) -> Self {
        Self {
            award_id: non_blank(record.award_id.as_deref()),
            recipient_name: record.recipient_name.clone(),
            recipient_id: record.recipient_id.clone(),
            recipient_uei: record.recipient_uei.clone(),
            start_date: parse_date(record.start_date.as_deref()),
            end_date: parse_date(record.end_date.as_deref()),
            award_amount: record.award_amount,
            description: record.description.clone(),
            awarding_agency: record.awarding_agency.clone(),
            awarding_sub_agency: record.awarding_sub_agency.clone(),
            award_type: record
                .contract_award_type
                .clone()
                .or_else(|| record.award_type.clone()),
            pop_city: record.pop_city.clone(),
            pop_state: record.pop_state.clone(),
            pop_zip: record.pop_zip.clone(),
            pop_country: record.pop_country.clone(),
            naics_code: first_present(
                record.naics.as_ref().and_then(CodeField::code),
                record.naics_code.as_deref(),
            ),
            naics_description: first_present(
                record.naics.as_ref().and_then(CodeField::description),
                record.naics_description.as_deref(),
            ),
            psc_code: first_present(
                record.psc.as_ref().and_then(CodeField::code),
                record.psc_code.as_deref(),
            ),
            psc_description: first_present(
                record.psc.as_ref().and_then(CodeField::description),
                record.psc_description.as_deref(),
            ),
            fallback_id: fallback_id(record),
            last_modified: parse_date(record.last_modified_date.as_deref()),
            fetched_at,
        }
    }

    /// The upstream award id, or the fallback id when it is missing.
    #[must_use]
    pub fn unique_key(&self) -> &str {
        self.award_id.as_deref().unwrap_or(&self.fallback_id)
    }

    /// Whether the award type label is one of [`CONTRACT_AWARD_TYPES`].
    /// Exact, case-sensitive comparison.
    #[must_use]
    pub fn is_contract(&self) -> bool {
        self.award_type
            .as_deref()
            .is_some_and(|t| CONTRACT_AWARD_TYPES.contains(&t))
    }

    /// The award amount, or zero when it is missing.
    #[must_use]
    pub fn safe_award_amount(&self) -> Decimal {
        self.award_amount.unwrap_or(Decimal::ZERO)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn first_present(primary: Option<&str>, secondary: Option<&str>) -> Option<String> {
    non_blank(primary).or_else(|| non_blank(secondary))
}

fn fallback_id(record: &AwardRecord) -> String {
    non_blank(record.generated_internal_id.as_deref())
        .or_else(|| record.internal_id.map(|id| id.to_string()))
        .unwrap_or_else(|| format!("generated-{}", uuid::Uuid::new_v4()))
}

/// Parses `YYYY-MM-DD`, also accepting the date prefix of a timestamp.
fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    let date = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched_at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn reduce(json: serde_json::Value) -> UsaSpendingAwardRecord {
        let record: AwardRecord = serde_json::from_value(json).unwrap();
        UsaSpendingAwardRecord::from_record(&record, fetched_at())
    }

    #[test]
    fn reduces_full_contract_row() {
        let award = reduce(serde_json::json!({
            "internal_id": 123_456,
            "generated_internal_id": "CONT_AWD_W91CRB20C0001_9700_-NONE-_-NONE-",
            "Award ID": "W91CRB20C0001",
            "Recipient Name": "ACME FEDERAL LLC",
            "recipient_id": "abc-R",
            "Recipient UEI": "ZQGGHJH74DW7",
            "Start Date": "2023-10-01",
            "End Date": "2025-09-30",
            "Last Modified Date": "2024-02-14 09:30:00",
            "Award Amount": 2_500_000.75,
            "Description": "IT MODERNIZATION SUPPORT",
            "Awarding Agency": "Department of Defense",
            "Awarding Sub Agency": "Department of the Army",
            "Contract Award Type": "Definitive Contract",
            "Place of Performance City Code": "ARLINGTON",
            "Place of Performance State Code": "VA",
            "Place of Performance Zip5": "22202",
            "Place of Performance Country Code": "USA",
            "NAICS": { "code": "541512", "description": "COMPUTER SYSTEMS DESIGN SERVICES" },
            "PSC": { "code": "DA01", "description": "IT AND TELECOM - BUSINESS APPLICATION" }
        }));

        assert_eq!(award.unique_key(), "W91CRB20C0001");
        assert!(award.is_contract());
        assert_eq!(award.safe_award_amount(), Decimal::new(250_000_075, 2));
        assert_eq!(award.start_date, NaiveDate::from_ymd_opt(2023, 10, 1));
        assert_eq!(award.last_modified, NaiveDate::from_ymd_opt(2024, 2, 14));
        assert_eq!(award.naics_code.as_deref(), Some("541512"));
        assert_eq!(award.psc_description.as_deref(), Some("IT AND TELECOM - BUSINESS APPLICATION"));
        assert_eq!(award.pop_state.as_deref(), Some("VA"));
        assert_eq!(award.fetched_at, fetched_at());
    }

    #[test]
    fn flat_code_columns_fill_in() {
        let award = reduce(serde_json::json!({
            "Award ID": "X1",
            "NAICS": "541330",
            "NAICS Description": "ENGINEERING SERVICES",
            "PSC Code": "R425",
            "PSC Description": "ENGINEERING AND TECHNICAL SERVICES"
        }));
        assert_eq!(award.naics_code.as_deref(), Some("541330"));
        assert_eq!(award.naics_description.as_deref(), Some("ENGINEERING SERVICES"));
        assert_eq!(award.psc_code.as_deref(), Some("R425"));
    }

    #[test]
    fn unique_key_falls_back_to_generated_id() {
        let award = reduce(serde_json::json!({
            "generated_internal_id": "ASST_NON_123"
        }));
        assert_eq!(award.award_id, None);
        assert_eq!(award.unique_key(), "ASST_NON_123");
    }

    #[test]
    fn blank_award_id_is_absent() {
        let award = reduce(serde_json::json!({ "Award ID": "  ", "internal_id": 42 }));
        assert_eq!(award.unique_key(), "42");
    }

    #[test]
    fn unique_key_is_never_empty() {
        let award = reduce(serde_json::json!({}));
        assert!(award.unique_key().starts_with("generated-"));
        assert!(award.unique_key().len() > "generated-".len());
    }

    #[test]
    fn contract_labels_are_exact() {
        let with_type = |label: &str| UsaSpendingAwardRecord {
            award_type: Some(label.to_string()),
            ..reduce(serde_json::json!({}))
        };
        assert!(with_type("Definitive Contract").is_contract());
        assert!(with_type("IDV").is_contract());
        assert!(!with_type("Grant").is_contract());
        assert!(!with_type("DEFINITIVE CONTRACT").is_contract());
        assert!(!with_type("idv").is_contract());
        assert!(!reduce(serde_json::json!({})).is_contract());
    }

    #[test]
    fn award_type_falls_back_to_assistance_label() {
        let award = reduce(serde_json::json!({ "Award Type": "Grant" }));
        assert_eq!(award.award_type.as_deref(), Some("Grant"));
        assert!(!award.is_contract());
    }

    #[test]
    fn safe_award_amount_defaults_to_zero() {
        let award = reduce(serde_json::json!({ "Award ID": "A" }));
        assert_eq!(award.award_amount, None);
        assert_eq!(award.safe_award_amount(), Decimal::ZERO);

        let award = reduce(serde_json::json!({ "Award Amount": "1000.10" }));
        assert_eq!(award.safe_award_amount(), Decimal::new(100_010, 2));
    }

    #[test]
    fn bad_dates_are_absent() {
        let award = reduce(serde_json::json!({ "Start Date": "10/01/2023", "End Date": "" }));
        assert_eq!(award.start_date, None);
        assert_eq!(award.end_date, None);
    }

    #[test]
    fn page_without_results_is_empty() {
        let page: SearchResponsePage = serde_json::from_value(serde_json::json!({
            "results": null
        }))
        .unwrap();
        assert!(page.awards().is_empty());
        assert!(!page.has_more());
        assert_eq!(page.total_count(), 0);

        let page: SearchResponsePage = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(page.awards().is_empty());
    }

    #[test]
    fn page_without_metadata_stops() {
        let page: SearchResponsePage = serde_json::from_value(serde_json::json!({
            "results": [{ "Award ID": "A" }, { "Award ID": "B" }]
        }))
        .unwrap();
        assert!(!page.has_more());
        assert_eq!(page.total_count(), 2);
    }

    #[test]
    fn page_metadata_drives_has_more_and_total() {
        let page: SearchResponsePage = serde_json::from_value(serde_json::json!({
            "results": [{ "Award ID": "A" }],
            "page_metadata": { "page": 1, "total": 100, "limit": 10, "next": 2, "previous": null, "hasNext": true, "hasPrevious": false },
            "messages": ["For searches, time period start and end dates are currently limited to an earliest date of 2007-10-01.", { "code": 1 }]
        }))
        .unwrap();
        assert!(page.has_more());
        assert_eq!(page.total_count(), 100);
        assert_eq!(page.page_metadata.as_ref().unwrap().next, Some(2));
        assert_eq!(page.messages.len(), 1);
    }

    #[test]
    fn null_page_flags_decode_as_false() {
        let page: SearchResponsePage = serde_json::from_value(serde_json::json!({
            "results": [{ "Award ID": "A" }, { "Award ID": "B" }],
            "page_metadata": { "page": 1, "total": 2, "hasNext": null, "hasPrevious": null }
        }))
        .unwrap();
        let metadata = page.page_metadata.as_ref().unwrap();
        assert!(!metadata.has_next);
        assert!(!metadata.has_previous);
        assert!(!page.has_more());
        assert_eq!(page.awards().len(), 2);
    }

    #[test]
    fn malformed_record_is_skipped() {
        let page: SearchResponsePage = serde_json::from_value(serde_json::json!({
            "results": [
                { "Award ID": "A" },
                { "Award ID": 17, "internal_id": "not a number" },
                { "Award ID": "C" }
            ],
            "page_metadata": { "page": 1, "hasNext": false }
        }))
        .unwrap();
        let ids: Vec<_> = page
            .awards()
            .iter()
            .map(|r| r.award_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, ["A", "C"]);
    }
}
