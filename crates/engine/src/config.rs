//! Per-destination settings, deserialized by the application from its
//! settings file.

use std::{collections::HashMap, path::PathBuf};

use serde::Deserialize;

use crate::DestinationName;

/// Placeholder shipped in the sample settings for the YNAB access token.
pub const INITIAL_YNAB_ACCESS_TOKEN: &str = "AABB";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DestinationsConfig {
    pub ynab: Option<YnabConfig>,
    pub spreadsheet: Option<SpreadsheetConfig>,
}

impl DestinationsConfig {
    /// Returns `true` if `name` is configured and marked active.
    pub fn is_active(&self, name: DestinationName) -> bool {
        match name {
            DestinationName::Ynab => self.ynab.as_ref().is_some_and(|c| c.active),
            DestinationName::Spreadsheet => self.spreadsheet.as_ref().is_some_and(|c| c.active),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct YnabConfig {
    #[serde(default)]
    pub active: bool,
    pub access_token: String,
    pub budget_id: String,
    #[serde(default)]
    pub account_numbers_to_ynab_account_ids: HashMap<String, String>,
    pub max_payee_name_length: Option<usize>,
}

impl Default for YnabConfig {
    fn default() -> Self {
        Self {
            active: false,
            access_token: INITIAL_YNAB_ACCESS_TOKEN.to_string(),
            budget_id: String::new(),
            account_numbers_to_ynab_account_ids: HashMap::new(),
            max_payee_name_length: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SpreadsheetConfig {
    #[serde(default)]
    pub active: bool,
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub account_numbers_to_sheet_accounts: HashMap<String, String>,
    pub max_description_length: Option<usize>,
}
