//! Translation of the dialog's filter state into a paged order lookup.

use crate::clients::{IdRef, OrdersLookup};
use crate::models::{AccountRef, Amount, ContributionFrequency, ImportedRow, OrderPage, OrderStatus};
use crate::services::amount_range::{amount_range_filter, AmountRange};
use crate::services::metrics::{record_candidate_query, record_error};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use recon_core::error::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const DEFAULT_PAGE_SIZE: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Start of the `from` day, UTC.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.from
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|t| Utc.from_utc_datetime(&t))
    }

    /// Last second of the `to` day, UTC, so the range includes that day.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.to
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .map(|t| Utc.from_utc_datetime(&t))
    }
}

/// What the operator has asked to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilters {
    pub search_term: Option<String>,
    pub status: Vec<OrderStatus>,
    pub amount: Option<AmountRange>,
    pub date_range: DateRange,
    pub frequency: Option<ContributionFrequency>,
    pub offset: u32,
    pub limit: u32,
}

impl CandidateFilters {
    /// Defaults for a freshly opened dialog: pending orders whose amount is
    /// close to the row's.
    pub fn for_row(row: &ImportedRow, page_size: u32) -> Result<Self, AppError> {
        Ok(Self {
            search_term: None,
            status: vec![OrderStatus::Pending],
            amount: Some(amount_range_filter(row.amount.value_in_cents)?),
            date_range: DateRange::default(),
            frequency: None,
            offset: 0,
            limit: page_size.max(1),
        })
    }

    pub fn with_search_term(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search_term = if term.is_empty() {
            None
        } else {
            Some(term.to_string())
        };
        self.offset = 0;
        self
    }

    pub fn next_page(&self) -> Self {
        Self {
            offset: self.offset.saturating_add(self.limit),
            ..self.clone()
        }
    }

    pub fn previous_page(&self) -> Self {
        Self {
            offset: self.offset.saturating_sub(self.limit),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRangeInput {
    pub gte: Amount,
    pub lte: Amount,
}

/// A single lookup request, already shaped as the lookup service expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateQuery {
    pub host: IdRef,
    pub filter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    pub status: Vec<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<AmountRangeInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<ContributionFrequency>,
    pub offset: u32,
    pub limit: u32,
}

/// Result of the latest lookup, as displayed in place of the candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    NotLoaded,
    Loaded(OrderPage),
    Failed(String),
}

impl QueryState {
    pub fn page(&self) -> Option<&OrderPage> {
        match self {
            QueryState::Loaded(page) => Some(page),
            _ => None,
        }
    }
}

pub struct CandidateQueryAdapter {
    lookup: Arc<dyn OrdersLookup>,
    host: AccountRef,
    currency: String,
}

impl CandidateQueryAdapter {
    pub fn new(lookup: Arc<dyn OrdersLookup>, host: AccountRef, currency: &str) -> Self {
        Self {
            lookup,
            host,
            currency: currency.to_string(),
        }
    }

    pub fn build_query(&self, filters: &CandidateFilters) -> CandidateQuery {
        CandidateQuery {
            host: IdRef {
                id: self.host.id.clone(),
            },
            filter: "INCOMING".to_string(),
            search_term: filters.search_term.clone(),
            status: filters.status.clone(),
            amount: filters.amount.map(|range| AmountRangeInput {
                gte: Amount::new(range.gte, self.currency.as_str()),
                lte: Amount::new(range.lte, self.currency.as_str()),
            }),
            date_from: filters.date_range.start(),
            date_to: filters.date_range.end(),
            frequency: filters.frequency,
            offset: filters.offset,
            limit: filters.limit,
        }
    }

    /// Run the lookup. Failures become a displayable state rather than an
    /// error; the operator retries by changing filters.
    #[instrument(skip(self, filters), fields(host_id = %self.host.id, offset = filters.offset))]
    pub async fn fetch(&self, filters: &CandidateFilters) -> QueryState {
        let query = self.build_query(filters);

        match self.lookup.search_orders(&query).await {
            Ok(page) => {
                record_candidate_query("success");
                info!(
                    total_count = page.total_count,
                    returned = page.nodes.len(),
                    "Candidate orders loaded"
                );
                QueryState::Loaded(page)
            }
            Err(e) => {
                let err = AppError::from(e);
                record_candidate_query("failure");
                record_error(err.kind());
                warn!(error = %err, "Candidate lookup failed");
                QueryState::Failed(err.display_message())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockOrdersLookup;

    fn filters() -> CandidateFilters {
        CandidateFilters {
            search_term: None,
            status: vec![OrderStatus::Pending],
            amount: None,
            date_range: DateRange::default(),
            frequency: None,
            offset: 0,
            limit: 5,
        }
    }

    #[test]
    fn next_page_saturates_at_maximum_offset() {
        let last = CandidateFilters {
            offset: u32::MAX - 2,
            ..filters()
        };
        assert_eq!(last.next_page().offset, u32::MAX);
    }

    #[test]
    fn date_range_is_sent_as_whole_utc_days() {
        let adapter = CandidateQueryAdapter::new(
            Arc::new(MockOrdersLookup::new(vec![])),
            AccountRef::new("host-1"),
            "USD",
        );
        let filters = CandidateFilters {
            date_range: DateRange {
                from: NaiveDate::from_ymd_opt(2024, 3, 1),
                to: NaiveDate::from_ymd_opt(2024, 3, 31),
            },
            ..filters()
        };

        let query = adapter.build_query(&filters);
        let variables = serde_json::to_value(&query).unwrap();

        assert_eq!(variables["dateFrom"], "2024-03-01T00:00:00Z");
        assert_eq!(variables["dateTo"], "2024-03-31T23:59:59Z");
    }
}
