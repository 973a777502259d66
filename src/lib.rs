//! Tradewatch - client library for the Schwab trader REST API.
//!
//! Handles the OAuth2 token lifecycle (authorization-code and refresh-token
//! grants) over a dotenv-format credential store, and exposes convenience
//! methods for fetching account and order data.
//!
//! The usual flow:
//!
//! 1. Load [`auth::Credentials`] from an [`auth::EnvStore`].
//! 2. Build an [`auth::Session`] and call `ensure_authenticated`.
//! 3. Hand the session's headers to an [`api::ApiClient`] and query away.

pub mod api;
pub mod auth;
pub mod models;
pub mod utils;
