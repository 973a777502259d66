//! HTTP-level tests for the trader API wrappers against a mock server.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tradewatch::api::ApiClient;

fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("header"),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn accounts_body() -> serde_json::Value {
    serde_json::json!([
        {"accountNumber": "123456789", "hashValue": "HASH-A"},
        {"accountNumber": "987654321", "hashValue": "HASH-B"}
    ])
}

#[tokio::test]
async fn fetches_accounts_with_session_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trader/v1/accounts/accountNumbers"))
        .and(header("authorization", "Bearer abc"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accounts_body()))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), bearer_headers("abc")).expect("client");
    let accounts = api.fetch_account_numbers().await.expect("accounts");

    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].account_number, "123456789");
    assert_eq!(accounts[0].hash_value, "HASH-A");
}

#[tokio::test]
async fn resolves_encrypted_account_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trader/v1/accounts/accountNumbers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accounts_body()))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), bearer_headers("abc")).expect("client");

    // First account when none is named
    let first = api.encrypted_account_id(None).await.expect("first");
    assert_eq!(first, "HASH-A");

    // Named account
    let named = api
        .encrypted_account_id(Some("987654321"))
        .await
        .expect("named");
    assert_eq!(named, "HASH-B");

    // Unknown account number
    let err = api
        .encrypted_account_id(Some("000000000"))
        .await
        .expect_err("unknown account");
    assert!(err.to_string().contains("000000000"));
}

#[tokio::test]
async fn fetches_orders_with_range_and_status_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trader/v1/accounts/HASH-A/orders"))
        .and(query_param("maxResults", "3000"))
        .and(query_param("status", "FILLED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "orderId": 1001,
                "status": "FILLED",
                "orderType": "LIMIT",
                "duration": "DAY",
                "price": 187.25,
                "enteredTime": "2026-08-01T14:03:27+0000",
                "orderLegCollection": [
                    {"instruction": "BUY", "quantity": 10, "instrument": {"symbol": "AAPL"}}
                ]
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), bearer_headers("abc")).expect("client");
    let orders = api
        .fetch_orders("HASH-A", 30, 3000, Some("FILLED"))
        .await
        .expect("orders");

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_id, Some(1001));
    assert_eq!(orders[0].symbol(), Some("AAPL"));
}

#[tokio::test]
async fn expired_token_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trader/v1/accounts/accountNumbers"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), bearer_headers("stale")).expect("client");
    let err = api.fetch_account_numbers().await.expect_err("unauthorized");
    assert!(matches!(
        err.downcast_ref::<tradewatch::api::ApiError>(),
        Some(tradewatch::api::ApiError::Unauthorized)
    ));
}

#[tokio::test]
async fn account_sweep_substitutes_empty_list_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trader/v1/accounts/accountNumbers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accounts_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/trader/v1/accounts/HASH-A/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"orderId": 1001, "status": "WORKING"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/trader/v1/accounts/HASH-B/orders"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri(), bearer_headers("abc")).expect("client");
    let all_orders = api
        .fetch_all_accounts_orders(30, 3000, None)
        .await
        .expect("sweep");

    assert_eq!(all_orders.len(), 2);
    assert_eq!(all_orders.get("123456789").map(Vec::len), Some(1));
    assert_eq!(all_orders.get("987654321").map(Vec::len), Some(0));
}
