//! Transaction shapes flowing through an export run.
//!
//! [`EnrichedTransaction`] is what the import stage hands over, one list per
//! scraped account. Each destination turns it into a
//! [`NormalizedTransaction`] using its own conventions and compares it with
//! the [`RemoteTransaction`]s it already holds.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the bank the transaction was scraped from.
///
/// Scrapers report either numeric or textual ids; the value is carried
/// around untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Number(id) => write!(f, "{id}"),
            SourceId::Text(id) => f.write_str(id),
        }
    }
}

/// A scraped transaction after the import stage enriched it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTransaction {
    pub account_number: String,
    /// Signed amount in the major currency unit (negative = expense).
    pub charged_amount: f64,
    pub date: DateTime<FixedOffset>,
    pub description: String,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub identifier: Option<SourceId>,
}

/// A transaction in the wire conventions of one destination.
///
/// `amount` is in the destination minor unit, `date` is rendered with the
/// destination date format and `payee_name` is already truncated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedTransaction {
    pub account_id: String,
    pub date: String,
    pub amount: i64,
    pub payee_name: String,
    pub category_id: Option<String>,
    pub memo: Option<String>,
}

/// A transaction already stored at a destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteTransaction {
    pub id: String,
    pub account_id: String,
    pub date: String,
    pub amount: i64,
    pub payee_name: Option<String>,
    /// Set when the destination recorded the transaction as a transfer
    /// between two accounts.
    pub transfer_account_id: Option<String>,
}

impl RemoteTransaction {
    pub fn is_transfer(&self) -> bool {
        self.transfer_account_id.is_some()
    }
}

/// What a destination reports back after a batch create.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CreationResult {
    pub transaction_ids: Vec<String>,
    /// Import ids the destination refused as duplicates.
    pub duplicate_import_ids: Vec<String>,
}

impl CreationResult {
    pub fn created(&self) -> usize {
        self.transaction_ids.len()
    }
}
