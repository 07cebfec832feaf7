//! Domain models for row-matching.
//!
//! Field names serialize in camelCase so the same types double as the
//! GraphQL payload shapes and as entity cache fragments.

#![allow(clippy::should_implement_trait)]

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Money
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
    pub value_in_cents: i64,
    pub currency: String,
}

impl Amount {
    pub fn new(value_in_cents: i64, currency: impl Into<String>) -> Self {
        Self {
            value_in_cents,
            currency: currency.into(),
        }
    }
}

// ============================================================================
// Account Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRef {
    pub id: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl AccountRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: None,
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

// ============================================================================
// Order Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Pending,
    Paid,
    Processing,
    Active,
    Error,
    Rejected,
    Cancelled,
    Expired,
    Refunded,
    Disputed,
    InReview,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Processing => "PROCESSING",
            Self::Active => "ACTIVE",
            Self::Error => "ERROR",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
            Self::Refunded => "REFUNDED",
            Self::Disputed => "DISPUTED",
            Self::InReview => "IN_REVIEW",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "NEW" => Self::New,
            "PENDING" => Self::Pending,
            "PAID" => Self::Paid,
            "PROCESSING" => Self::Processing,
            "ACTIVE" => Self::Active,
            "ERROR" => Self::Error,
            "REJECTED" => Self::Rejected,
            "CANCELLED" => Self::Cancelled,
            "EXPIRED" => Self::Expired,
            "REFUNDED" => Self::Refunded,
            "DISPUTED" => Self::Disputed,
            "IN_REVIEW" => Self::InReview,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionFrequency {
    Onetime,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FromAccountInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingContributionData {
    #[serde(default)]
    pub expected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub ponumber: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub from_account_info: Option<FromAccountInfo>,
}

/// An existing contribution that may be matched against an imported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateOrder {
    pub id: String,
    pub legacy_id: i64,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub frequency: Option<ContributionFrequency>,
    pub total_amount: Amount,
    #[serde(default)]
    pub platform_tip_amount: Option<Amount>,
    #[serde(default)]
    pub pending_contribution_data: Option<PendingContributionData>,
    pub from_account: AccountRef,
    pub to_account: AccountRef,
    #[serde(default)]
    pub tier: Option<TierRef>,
}

impl CandidateOrder {
    /// Pending (or status-less) orders still need a payment to be recorded;
    /// anything else can only be linked as-is.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self.status, None | Some(OrderStatus::Pending))
    }
}

/// Minimal order reference stored on a matched row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRef {
    pub id: String,
    #[serde(default)]
    pub legacy_id: Option<i64>,
}

impl From<&CandidateOrder> for OrderRef {
    fn from(o: &CandidateOrder) -> Self {
        Self {
            id: o.id.clone(),
            legacy_id: Some(o.legacy_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub total_count: u32,
    pub offset: u32,
    pub limit: u32,
    pub nodes: Vec<CandidateOrder>,
}

impl OrderPage {
    pub fn find(&self, order_id: &str) -> Option<&CandidateOrder> {
        self.nodes.iter().find(|o| o.id == order_id)
    }

    pub fn has_next_page(&self) -> bool {
        self.offset.saturating_add(self.nodes.len() as u32) < self.total_count
    }
}

// ============================================================================
// Import Models
// ============================================================================

/// One bank-statement line awaiting reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedRow {
    pub id: String,
    pub import_id: String,
    pub amount: Amount,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub raw_value: BTreeMap<String, String>,
    #[serde(default)]
    pub order: Option<OrderRef>,
}

impl ImportedRow {
    pub fn processed_on(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub ignored: u32,
    #[serde(default)]
    pub expenses: u32,
    #[serde(default)]
    pub orders: u32,
    #[serde(default)]
    pub processed: u32,
}

/// Source CSV columns that were mapped onto row fields during import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub credit: Option<String>,
    #[serde(default)]
    pub debit: Option<String>,
}

impl ColumnMapping {
    pub fn mapped_columns(&self) -> impl Iterator<Item = &str> {
        [&self.date, &self.amount, &self.credit, &self.debit]
            .into_iter()
            .filter_map(|c| c.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvConfig {
    #[serde(default)]
    pub columns: ColumnMapping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsImport {
    pub id: String,
    pub account: AccountRef,
    #[serde(default)]
    pub csv_config: Option<CsvConfig>,
    #[serde(default)]
    pub stats: ImportStats,
}
