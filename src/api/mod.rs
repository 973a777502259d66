//! REST API client module for the trader endpoints.
//!
//! This module provides the `ApiClient` for fetching account numbers with
//! their encrypted IDs and order history with status filtering.
//!
//! Order endpoints require the encrypted account ID (hashValue) returned
//! by the account-numbers endpoint, not the plain account number.

pub mod client;
pub mod error;

pub use client::{filter_by_status, filter_by_symbol, ApiClient, DEFAULT_MAX_RESULTS};
pub use error::ApiError;
