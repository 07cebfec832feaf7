//! Integration tests for the GraphQL client against a mock HTTP server.

mod common;

use chrono::NaiveDate;
use recon_core::error::AppError;
use recon_core::http::RetryConfig;
use row_matching::clients::{
    ClientError, ConfirmContributionRequest, ContributionConfirmer, GraphqlClient, IdRef,
    OrdersLookup, RowUpdateRequest, RowUpdater,
};
use row_matching::models::{Amount, OrderStatus};
use row_matching::services::CandidateQuery;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        add_jitter: false,
        ..RetryConfig::with_max_retries(max_retries)
    }
}

fn client(server: &MockServer, retry: RetryConfig) -> GraphqlClient {
    common::init_tracing();
    GraphqlClient::new(
        &format!("{}/graphql", server.uri()),
        Some(SecretString::new(TOKEN.to_string())),
        Duration::from_secs(5),
        "row-matching-tests",
        retry,
    )
    .expect("Failed to build client")
}

fn query() -> CandidateQuery {
    CandidateQuery {
        host: IdRef {
            id: common::HOST_ID.to_string(),
        },
        filter: "INCOMING".to_string(),
        search_term: None,
        status: vec![OrderStatus::Pending],
        amount: None,
        date_from: None,
        date_to: None,
        frequency: None,
        offset: 0,
        limit: 5,
    }
}

fn order_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "legacyId": 77,
        "status": status,
        "description": "Monthly donation",
        "totalAmount": { "valueInCents": 12000, "currency": "USD" },
        "fromAccount": { "id": "acme", "slug": "acme", "name": "Acme Corp" },
        "toAccount": { "id": "collective", "slug": "collective", "name": null }
    })
}

fn orders_response() -> Value {
    json!({
        "data": {
            "orders": {
                "totalCount": 1,
                "offset": 0,
                "limit": 5,
                "nodes": [order_json("order-1", "PENDING")]
            }
        }
    })
}

#[tokio::test]
async fn search_orders_sends_query_variables_and_parses_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "operationName": "TransactionsImportRowMatchCandidates",
            "variables": {
                "host": { "id": "host-1" },
                "filter": "INCOMING",
                "status": ["PENDING"],
                "offset": 0,
                "limit": 5
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(orders_response()))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server, fast_retry(0))
        .search_orders(&query())
        .await
        .unwrap();

    assert_eq!(page.total_count, 1);
    assert_eq!(page.nodes[0].id, "order-1");
    assert_eq!(page.nodes[0].status, Some(OrderStatus::Pending));
    assert_eq!(page.nodes[0].total_amount, Amount::new(12000, "USD"));
}

#[tokio::test]
async fn search_orders_retries_unavailable_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(orders_response()))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server, fast_retry(2))
        .search_orders(&query())
        .await
        .unwrap();

    assert_eq!(page.nodes.len(), 1);
}

#[tokio::test]
async fn search_orders_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server, fast_retry(2))
        .search_orders(&query())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Http { status: 502, .. }));
}

#[tokio::test]
async fn graphql_errors_surface_first_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [
                { "message": "You need to be logged in as an admin of the host" },
                { "message": "second" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, fast_retry(2))
        .search_orders(&query())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "You need to be logged in as an admin of the host"
    );
}

#[tokio::test]
async fn confirm_contribution_is_sent_once_even_when_upstream_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({
            "operationName": "ConfirmContribution",
            "variables": {
                "order": {
                    "id": "order-1",
                    "amountReceived": { "valueInCents": 12345, "currency": "USD" },
                    "paymentProcessorFee": { "valueInCents": 0, "currency": "USD" },
                    "processedAt": "2024-03-15",
                    "transactionsImportRow": { "id": "row-1" }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let request = ConfirmContributionRequest {
        order_id: "order-1".to_string(),
        amount_received: Amount::new(12345, "USD"),
        payment_processor_fee: Amount::new(0, "USD"),
        platform_tip: Amount::new(0, "USD"),
        processed_at: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        transactions_import_row: IdRef {
            id: "row-1".to_string(),
        },
    };

    let err = client(&server, fast_retry(2))
        .confirm_contribution(&request)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Http { status: 503, .. }));
}

#[tokio::test]
async fn confirm_contribution_returns_updated_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "processPendingOrder": order_json("order-1", "PAID") }
        })))
        .mount(&server)
        .await;

    let request = ConfirmContributionRequest {
        order_id: "order-1".to_string(),
        amount_received: Amount::new(12000, "USD"),
        payment_processor_fee: Amount::new(0, "USD"),
        platform_tip: Amount::new(0, "USD"),
        processed_at: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        transactions_import_row: IdRef {
            id: "row-1".to_string(),
        },
    };

    let order = client(&server, fast_retry(0))
        .confirm_contribution(&request)
        .await
        .unwrap();

    assert_eq!(order.status, Some(OrderStatus::Paid));
    assert_eq!(order.legacy_id, 77);
}

#[tokio::test]
async fn update_rows_sends_exact_link_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({
            "operationName": "UpdateTransactionsImportRows",
            "variables": {
                "importId": "import-1",
                "rows": [{ "id": "row-1", "order": { "id": "order-9" } }]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "updateTransactionsImportRows": [
                    { "id": "row-1", "order": { "id": "order-9", "legacyId": 9 } }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = client(&server, fast_retry(2))
        .update_rows(&RowUpdateRequest::link_single("import-1", "row-1", "order-9"))
        .await
        .unwrap();

    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].order.as_ref().map(|o| o.legacy_id), Some(Some(9)));

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(
        body["variables"],
        json!({
            "importId": "import-1",
            "rows": [{ "id": "row-1", "order": { "id": "order-9" } }]
        })
    );
}

#[tokio::test]
async fn missing_data_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = client(&server, fast_retry(0))
        .update_rows(&RowUpdateRequest::link_single("import-1", "row-1", "order-9"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn rejected_update_shows_upstream_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{ "message": "Row is already matched" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, fast_retry(2))
        .update_rows(&RowUpdateRequest::link_single("import-1", "row-1", "order-9"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Upstream(_)));
    assert_eq!(AppError::from(err).display_message(), "Row is already matched");
}
