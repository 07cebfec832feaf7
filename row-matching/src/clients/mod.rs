//! Collaborators that live outside this crate.
//!
//! Every remote service the matcher talks to sits behind one of these traits.
//! [`GraphqlClient`] implements all of them against the platform API; the
//! mocks back the tests.

pub mod graphql;
pub mod mock;

use crate::models::{Amount, CandidateOrder, OrderPage, OrderRef};
use crate::services::candidate_query::CandidateQuery;
use async_trait::async_trait;
use chrono::NaiveDate;
use recon_core::error::AppError;
use recon_core::http::Retryable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use graphql::GraphqlClient;
pub use mock::{MockContributionConfirmer, MockOrdersLookup, MockRowUpdater};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Upstream returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("{0}")]
    Upstream(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl Retryable for ClientError {
    fn is_retryable(&self) -> bool {
        match self {
            ClientError::Connection(_) | ClientError::Timeout(_) => true,
            ClientError::Http { status, .. } => *status == 429 || *status >= 500,
            ClientError::Upstream(_) | ClientError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ClientError::Connection(err.to_string())
        }
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Connection(msg) | ClientError::Timeout(msg) => {
                AppError::ServiceUnavailable(msg)
            }
            ClientError::Http { status, message } => {
                AppError::BadGateway(format!("HTTP {}: {}", status, message))
            }
            ClientError::Upstream(msg) => AppError::BadGateway(msg),
            ClientError::Decode(msg) => {
                AppError::InternalError(anyhow::anyhow!("Invalid upstream response: {}", msg))
            }
        }
    }
}

// ============================================================================
// Request / response shapes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: String,
}

/// Payload for recording a received payment against a pending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmContributionRequest {
    #[serde(rename = "id")]
    pub order_id: String,
    pub amount_received: Amount,
    pub payment_processor_fee: Amount,
    pub platform_tip: Amount,
    pub processed_at: NaiveDate,
    pub transactions_import_row: IdRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOrderLink {
    pub id: String,
    pub order: IdRef,
}

/// Bulk row update; serializes to `{importId, rows: [{id, order: {id}}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowUpdateRequest {
    pub import_id: String,
    pub rows: Vec<RowOrderLink>,
}

impl RowUpdateRequest {
    pub fn link_single(import_id: &str, row_id: &str, order_id: &str) -> Self {
        Self {
            import_id: import_id.to_string(),
            rows: vec![RowOrderLink {
                id: row_id.to_string(),
                order: IdRef {
                    id: order_id.to_string(),
                },
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedRow {
    pub id: String,
    #[serde(default)]
    pub order: Option<OrderRef>,
}

// ============================================================================
// Collaborator traits
// ============================================================================

#[async_trait]
pub trait OrdersLookup: Send + Sync {
    /// Fetch one page of incoming orders for the host described by `query`.
    async fn search_orders(&self, query: &CandidateQuery) -> Result<OrderPage, ClientError>;
}

#[async_trait]
pub trait ContributionConfirmer: Send + Sync {
    /// Mark a pending order as paid; returns the order as it is now.
    async fn confirm_contribution(
        &self,
        request: &ConfirmContributionRequest,
    ) -> Result<CandidateOrder, ClientError>;
}

#[async_trait]
pub trait RowUpdater: Send + Sync {
    async fn update_rows(&self, request: &RowUpdateRequest) -> Result<Vec<UpdatedRow>, ClientError>;
}
