use serde::{Deserialize, Serialize};

/// A linked account: the plain number for display and the encrypted
/// hashValue the order and transaction endpoints require.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "accountNumber")]
    pub account_number: String,
    #[serde(rename = "hashValue")]
    pub hash_value: String,
}
