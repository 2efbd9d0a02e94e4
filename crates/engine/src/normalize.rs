//! Conversion of [`EnrichedTransaction`]s into a destination wire shape.

use std::collections::HashMap;

use crate::{EnrichedTransaction, ExportError, NormalizedTransaction, ResultExport};

/// Used when the destination configuration does not set a limit.
pub const DEFAULT_MAX_DESCRIPTION_LENGTH: usize = 50;

/// A destination category, as returned by the remote client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub category_group_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryGroup {
    pub id: String,
    pub name: String,
    pub categories: Vec<Category>,
}

/// Resolves a category label into the value the destination stores.
pub trait CategoryLookup {
    fn resolve(&self, label: &str) -> Option<String>;
}

/// Category display name to destination category, built in one go from the
/// destination groups.
#[derive(Clone, Debug, Default)]
pub struct CategoryIndex {
    by_name: HashMap<String, Category>,
}

impl CategoryIndex {
    pub fn from_groups(groups: Vec<CategoryGroup>) -> Self {
        let by_name = groups
            .into_iter()
            .flat_map(|group| group.categories)
            .map(|category| (category.name.clone(), category))
            .collect();
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl CategoryLookup for CategoryIndex {
    fn resolve(&self, label: &str) -> Option<String> {
        self.get(label).map(|category| category.id.clone())
    }
}

/// Keeps the label as is, for destinations that store category names.
#[derive(Clone, Copy, Debug, Default)]
pub struct CategoryLabel;

impl CategoryLookup for CategoryLabel {
    fn resolve(&self, label: &str) -> Option<String> {
        Some(label.to_string())
    }
}

/// Destination conventions applied by [`normalize`].
#[derive(Clone, Copy, Debug)]
pub struct NormalizeOptions<'a> {
    /// Minor units per major currency unit.
    pub amount_scale: i64,
    /// `chrono` format string for the calendar date.
    pub date_format: &'a str,
    pub max_description_length: usize,
    /// Scraped account number to destination account id.
    pub accounts: &'a HashMap<String, String>,
}

pub fn normalize(
    transaction: &EnrichedTransaction,
    options: &NormalizeOptions<'_>,
    categories: &dyn CategoryLookup,
) -> ResultExport<NormalizedTransaction> {
    let account_id = resolve_account(&transaction.account_number, options.accounts)?;
    let category_id = match transaction.category.as_deref() {
        None | Some("") => None,
        Some(label) => Some(
            categories
                .resolve(label)
                .ok_or_else(|| ExportError::UnknownCategory(label.to_string()))?,
        ),
    };

    Ok(NormalizedTransaction {
        account_id,
        date: transaction
            .date
            .date_naive()
            .format(options.date_format)
            .to_string(),
        amount: scale_amount(transaction.charged_amount, options.amount_scale),
        payee_name: truncate(&transaction.description, options.max_description_length),
        category_id,
        memo: transaction.memo.clone(),
    })
}

/// Normalizes the whole batch, failing on the first transaction that cannot
/// be converted.
pub fn normalize_all(
    transactions: &[EnrichedTransaction],
    options: &NormalizeOptions<'_>,
    categories: &dyn CategoryLookup,
) -> ResultExport<Vec<NormalizedTransaction>> {
    transactions
        .iter()
        .map(|transaction| normalize(transaction, options, categories))
        .collect()
}

/// Rounds half away from zero.
pub fn scale_amount(amount: f64, scale: i64) -> i64 {
    (amount * scale as f64).round() as i64
}

fn resolve_account(account_number: &str, accounts: &HashMap<String, String>) -> ResultExport<String> {
    accounts
        .get(account_number)
        .filter(|id| !id.is_empty())
        .cloned()
        .ok_or_else(|| ExportError::UnmappedAccount(account_number.to_string()))
}

fn truncate(description: &str, max_len: usize) -> String {
    description.chars().take(max_len).collect()
}
