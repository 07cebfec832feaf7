//! GraphQL-over-HTTP client for the platform API.
//!
//! Implements every remote collaborator of the match dialog. Only the order
//! lookup is retried; mutations run exactly once.

use super::{
    ClientError, ConfirmContributionRequest, ContributionConfirmer, OrdersLookup, RowUpdateRequest,
    RowUpdater, UpdatedRow,
};
use crate::config::MatchingConfig;
use crate::models::{CandidateOrder, OrderPage};
use crate::services::candidate_query::CandidateQuery;
use crate::services::metrics::API_CALL_DURATION;
use async_trait::async_trait;
use recon_core::http::{retry_call, RetryConfig};
use recon_core::observability::TracedClientExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const ORDER_FIELDS: &str = r#"
    id
    legacyId
    status
    description
    createdAt
    frequency
    totalAmount { valueInCents currency }
    platformTipAmount { valueInCents currency }
    pendingContributionData {
      expectedAt
      paymentMethod
      ponumber
      memo
      fromAccountInfo { name email }
    }
    fromAccount { id slug name }
    toAccount { id slug name }
    tier { id name }
"#;

fn search_orders_query() -> String {
    format!(
        r#"query TransactionsImportRowMatchCandidates(
  $host: AccountReferenceInput!
  $filter: AccountOrdersFilter
  $searchTerm: String
  $status: [OrderStatus]
  $amount: OrderAmountRange
  $dateFrom: DateTime
  $dateTo: DateTime
  $frequency: ContributionFrequency
  $offset: Int
  $limit: Int
) {{
  orders(
    account: $host
    filter: $filter
    includeIncognito: true
    searchTerm: $searchTerm
    status: $status
    amount: $amount
    dateFrom: $dateFrom
    dateTo: $dateTo
    frequency: $frequency
    offset: $offset
    limit: $limit
  ) {{
    totalCount
    offset
    limit
    nodes {{ {fields} }}
  }}
}}"#,
        fields = ORDER_FIELDS
    )
}

fn confirm_contribution_mutation() -> String {
    format!(
        r#"mutation ConfirmContribution($order: OrderUpdateInput!) {{
  processPendingOrder(order: $order, action: MARK_AS_PAID) {{ {fields} }}
}}"#,
        fields = ORDER_FIELDS
    )
}

const UPDATE_ROWS_MUTATION: &str = r#"mutation UpdateTransactionsImportRows(
  $importId: NonEmptyString!
  $rows: [TransactionsImportRowUpdateInput!]!
) {
  updateTransactionsImportRows(importId: $importId, rows: $rows) {
    id
    order { id legacyId }
  }
}"#;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlRequest<'a, V: Serialize> {
    operation_name: &'a str,
    query: &'a str,
    variables: V,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Serialize)]
struct ConfirmContributionVariables<'a> {
    order: &'a ConfirmContributionRequest,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OrdersData {
    orders: OrderPage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessPendingOrderData {
    process_pending_order: CandidateOrder,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRowsData {
    update_transactions_import_rows: Vec<UpdatedRow>,
}

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Map a non-2xx reply to an error. Client errors carrying a GraphQL
/// `errors` list surface the first message; server errors stay `Http` so
/// they remain retryable.
fn error_for_status(status: u16, body: &str) -> ClientError {
    if (400..500).contains(&status) {
        if let Ok(payload) = serde_json::from_str::<GraphqlResponse<serde_json::Value>>(body) {
            if let Some(first) = payload.errors.into_iter().next() {
                return ClientError::Upstream(first.message);
            }
        }
    }

    let mut message: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
    if body.trim().chars().count() > MAX_ERROR_BODY_CHARS {
        message.push_str("...");
    }
    ClientError::Http { status, message }
}

#[derive(Clone)]
pub struct GraphqlClient {
    client: Client,
    url: String,
    token: Option<SecretString>,
    lookup_retry: RetryConfig,
}

impl GraphqlClient {
    pub fn new(
        url: &str,
        token: Option<SecretString>,
        timeout: Duration,
        user_agent: &str,
        lookup_retry: RetryConfig,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ClientError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
            token,
            lookup_retry,
        })
    }

    pub fn from_config(config: &MatchingConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.api.url,
            config.api.token.clone(),
            config.http_timeout(),
            &config.common.user_agent,
            config.api.lookup_retry(),
        )
    }

    /// Post one operation and unwrap its `data`.
    async fn execute<V, T>(
        &self,
        operation_name: &str,
        query: &str,
        variables: &V,
    ) -> Result<T, ClientError>
    where
        V: Serialize + Sync,
        T: DeserializeOwned,
    {
        let timer = API_CALL_DURATION
            .with_label_values(&[operation_name])
            .start_timer();

        let body = GraphqlRequest {
            operation_name,
            query,
            variables,
        };

        let mut request = self.client.traced_post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status.as_u16(), &body));
        }

        let payload: GraphqlResponse<T> = response.json().await?;
        timer.observe_duration();

        if let Some(first) = payload.errors.into_iter().next() {
            return Err(ClientError::Upstream(first.message));
        }

        payload.data.ok_or_else(|| {
            ClientError::Decode(format!("{} returned neither data nor errors", operation_name))
        })
    }
}

#[async_trait]
impl OrdersLookup for GraphqlClient {
    #[instrument(skip(self, query), fields(host_id = %query.host.id))]
    async fn search_orders(&self, query: &CandidateQuery) -> Result<OrderPage, ClientError> {
        let document = search_orders_query();
        let data: OrdersData = retry_call(&self.lookup_retry, "search_orders", || {
            self.execute("TransactionsImportRowMatchCandidates", &document, query)
        })
        .await?;

        debug!(total_count = data.orders.total_count, "Orders fetched");
        Ok(data.orders)
    }
}

#[async_trait]
impl ContributionConfirmer for GraphqlClient {
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn confirm_contribution(
        &self,
        request: &ConfirmContributionRequest,
    ) -> Result<CandidateOrder, ClientError> {
        let data: ProcessPendingOrderData = self
            .execute(
                "ConfirmContribution",
                &confirm_contribution_mutation(),
                &ConfirmContributionVariables { order: request },
            )
            .await?;

        Ok(data.process_pending_order)
    }
}

#[async_trait]
impl RowUpdater for GraphqlClient {
    #[instrument(skip(self, request), fields(import_id = %request.import_id, rows = request.rows.len()))]
    async fn update_rows(&self, request: &RowUpdateRequest) -> Result<Vec<UpdatedRow>, ClientError> {
        let data: UpdateRowsData = self
            .execute("UpdateTransactionsImportRows", UPDATE_ROWS_MUTATION, request)
            .await?;

        Ok(data.update_transactions_import_rows)
    }
}
