//! Data models for trader API entities.
//!
//! - `Account`: plain account number paired with its encrypted hashValue
//! - `Order` and its legs: the slice of the order payload the summary needs
//! - `OrderSummary`: one flattened row of the console order table

pub mod account;
pub mod order;

pub use account::Account;
pub use order::{Instrument, Order, OrderLeg, OrderSummary};
