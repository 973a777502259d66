//! API client for the trader REST endpoints.
//!
//! Thin request/response mapping over the authenticated session headers:
//! each method builds a URL, sends one request, and maps the JSON body into
//! a typed model. No retries, no caching.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{Account, Order};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum order lookback the trader API accepts.
const MAX_ORDER_RANGE_DAYS: i64 = 365;

/// Default cap on returned orders per request.
pub const DEFAULT_MAX_RESULTS: u32 = 3000;

/// API client for the trader endpoints.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
}

impl ApiClient {
    /// Create a client against `base_url` sending `headers` (the session's
    /// bearer + accept headers) with every request.
    pub fn new(base_url: &str, headers: HeaderMap) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    /// Create a new ApiClient with fresh session headers, sharing the
    /// connection pool.
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            headers,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(String, String)]) -> Result<T> {
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// Fetch the linked accounts with their encrypted hash values.
    pub async fn fetch_account_numbers(&self) -> Result<Vec<Account>> {
        let url = format!("{}/trader/v1/accounts/accountNumbers", self.base_url);
        self.get(&url, &[]).await
    }

    /// Resolve the encrypted account ID the order endpoints require. With no
    /// account number given, the first linked account is used.
    pub async fn encrypted_account_id(&self, account_number: Option<&str>) -> Result<String> {
        let accounts = self.fetch_account_numbers().await?;
        match account_number {
            None => accounts
                .into_iter()
                .next()
                .map(|account| account.hash_value)
                .context("No accounts found"),
            Some(number) => accounts
                .into_iter()
                .find(|account| account.account_number == number)
                .map(|account| account.hash_value)
                .with_context(|| format!("Account number {} not found", number)),
        }
    }

    /// Fetch orders for an account over the last `days` days, newest range
    /// the API allows being one year. `account_hash` must be the encrypted
    /// account ID.
    pub async fn fetch_orders(
        &self,
        account_hash: &str,
        days: i64,
        max_results: u32,
        status: Option<&str>,
    ) -> Result<Vec<Order>> {
        if days > MAX_ORDER_RANGE_DAYS {
            bail!(
                "days cannot exceed {} (trader API maximum date range is 1 year)",
                MAX_ORDER_RANGE_DAYS
            );
        }

        let to_date = Utc::now();
        let from_date = to_date - Duration::days(days);

        let mut query = vec![
            ("fromEnteredTime".to_string(), format_entered_param(&from_date)),
            ("toEnteredTime".to_string(), format_entered_param(&to_date)),
            ("maxResults".to_string(), max_results.to_string()),
        ];
        if let Some(status) = status {
            query.push(("status".to_string(), status.to_string()));
        }

        debug!(
            account_prefix = &account_hash[..account_hash.len().min(8)],
            days,
            status = status.unwrap_or("any"),
            "fetching orders"
        );

        let url = format!("{}/trader/v1/accounts/{}/orders", self.base_url, account_hash);
        self.get(&url, &query).await
    }

    /// Fetch orders for every linked account, keyed by plain account number.
    /// An account whose fetch fails contributes an empty list rather than
    /// aborting the sweep.
    pub async fn fetch_all_accounts_orders(
        &self,
        days: i64,
        max_results: u32,
        status: Option<&str>,
    ) -> Result<HashMap<String, Vec<Order>>> {
        let accounts = self.fetch_account_numbers().await?;

        let mut all_orders = HashMap::new();
        for account in accounts {
            match self
                .fetch_orders(&account.hash_value, days, max_results, status)
                .await
            {
                Ok(orders) => {
                    all_orders.insert(account.account_number, orders);
                }
                Err(e) => {
                    warn!(account = %account.account_number, "failed to retrieve orders: {}", e);
                    all_orders.insert(account.account_number, Vec::new());
                }
            }
        }
        Ok(all_orders)
    }
}

/// Entered-time format the trader API expects: yyyy-MM-dd'T'HH:mm:ss.SSSZ
fn format_entered_param(when: &DateTime<Utc>) -> String {
    when.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Keep only orders with a leg trading the given symbol.
pub fn filter_by_symbol(orders: &[Order], symbol: &str) -> Vec<Order> {
    orders
        .iter()
        .filter(|order| {
            order.order_legs.iter().any(|leg| {
                leg.instrument
                    .as_ref()
                    .and_then(|instrument| instrument.symbol.as_deref())
                    .is_some_and(|s| s.eq_ignore_ascii_case(symbol))
            })
        })
        .cloned()
        .collect()
}

/// Keep only orders in the given status.
pub fn filter_by_status(orders: &[Order], status: &str) -> Vec<Order> {
    orders
        .iter()
        .filter(|order| {
            order
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(status))
        })
        .cloned()
        .collect()
}
