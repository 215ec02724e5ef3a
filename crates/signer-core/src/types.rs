use std::fmt;

use serde::{Deserialize, Serialize};
use sol_rpc::{SignatureInfo, TransactionRecord};

/// Network-assigned transaction identifier (Base58 of the fee payer's
/// signature).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One past transaction for an address, with its details when the node
/// still has them.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub signature: SignatureInfo,
    pub transaction: Option<TransactionRecord>,
}
