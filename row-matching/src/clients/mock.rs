//! In-memory collaborators for tests and local runs.

use super::{
    ClientError, ConfirmContributionRequest, ContributionConfirmer, OrdersLookup, RowUpdateRequest,
    RowUpdater, UpdatedRow,
};
use crate::models::{CandidateOrder, OrderPage, OrderRef, OrderStatus};
use crate::services::candidate_query::CandidateQuery;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

fn lock<T: Clone>(m: &Mutex<T>) -> T {
    m.lock().map(|v| v.clone()).unwrap_or_else(|p| p.into_inner().clone())
}

/// Serves a fixed set of orders, paged and filtered by status.
pub struct MockOrdersLookup {
    orders: Vec<CandidateOrder>,
    failure: Option<String>,
    queries: Mutex<Vec<CandidateQuery>>,
}

impl MockOrdersLookup {
    pub fn new(orders: Vec<CandidateOrder>) -> Self {
        Self {
            orders,
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            orders: Vec::new(),
            failure: Some(message.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<CandidateQuery> {
        lock(&self.queries)
    }
}

#[async_trait]
impl OrdersLookup for MockOrdersLookup {
    async fn search_orders(&self, query: &CandidateQuery) -> Result<OrderPage, ClientError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        if let Some(message) = &self.failure {
            return Err(ClientError::Connection(message.clone()));
        }

        let matching: Vec<CandidateOrder> = self
            .orders
            .iter()
            .filter(|o| {
                query.status.is_empty()
                    || o.status.map(|s| query.status.contains(&s)).unwrap_or(true)
            })
            .cloned()
            .collect();

        let nodes = matching
            .iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(OrderPage {
            total_count: matching.len() as u32,
            offset: query.offset,
            limit: query.limit,
            nodes,
        })
    }
}

/// Confirms any order it is given, or fails every time.
pub struct MockContributionConfirmer {
    orders: Vec<CandidateOrder>,
    failure: Option<String>,
    requests: Mutex<Vec<ConfirmContributionRequest>>,
    confirm_count: AtomicU64,
}

impl MockContributionConfirmer {
    pub fn new(orders: Vec<CandidateOrder>) -> Self {
        Self {
            orders,
            failure: None,
            requests: Mutex::new(Vec::new()),
            confirm_count: AtomicU64::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            orders: Vec::new(),
            failure: Some(message.to_string()),
            requests: Mutex::new(Vec::new()),
            confirm_count: AtomicU64::new(0),
        }
    }

    pub fn requests(&self) -> Vec<ConfirmContributionRequest> {
        lock(&self.requests)
    }

    pub fn confirm_count(&self) -> u64 {
        self.confirm_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContributionConfirmer for MockContributionConfirmer {
    async fn confirm_contribution(
        &self,
        request: &ConfirmContributionRequest,
    ) -> Result<CandidateOrder, ClientError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(message) = &self.failure {
            return Err(ClientError::Upstream(message.clone()));
        }

        let mut order = self
            .orders
            .iter()
            .find(|o| o.id == request.order_id)
            .cloned()
            .ok_or_else(|| ClientError::Upstream(format!("Order {} not found", request.order_id)))?;

        self.confirm_count.fetch_add(1, Ordering::SeqCst);
        order.status = Some(OrderStatus::Paid);
        tracing::info!(order_id = %order.id, "[MOCK] Contribution would be confirmed");
        Ok(order)
    }
}

/// Accepts every row update, or fails every time.
pub struct MockRowUpdater {
    failure: Option<String>,
    requests: Mutex<Vec<RowUpdateRequest>>,
}

impl MockRowUpdater {
    pub fn new() -> Self {
        Self {
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RowUpdateRequest> {
        lock(&self.requests)
    }
}

impl Default for MockRowUpdater {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RowUpdater for MockRowUpdater {
    async fn update_rows(&self, request: &RowUpdateRequest) -> Result<Vec<UpdatedRow>, ClientError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(message) = &self.failure {
            return Err(ClientError::Upstream(message.clone()));
        }

        Ok(request
            .rows
            .iter()
            .map(|row| UpdatedRow {
                id: row.id.clone(),
                order: Some(OrderRef {
                    id: row.order.id.clone(),
                    legacy_id: None,
                }),
            })
            .collect())
    }
}
