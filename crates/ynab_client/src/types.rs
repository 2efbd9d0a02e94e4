//! JSON bodies of the YNAB API (v1) and their mapping to engine types.

use engine::{
    Account, BudgetSummary, Category, CategoryGroup, CreationResult, NormalizedTransaction,
    RemoteTransaction,
};
use serde::{Deserialize, Serialize};

/// Every successful YNAB response wraps its payload in `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub id: String,
    pub name: String,
    pub detail: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BudgetsData {
    pub budgets: Vec<BudgetDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BudgetDto {
    pub id: String,
    pub name: String,
}

impl From<BudgetDto> for BudgetSummary {
    fn from(value: BudgetDto) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountsData {
    pub accounts: Vec<AccountDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl From<AccountDto> for Account {
    fn from(value: AccountDto) -> Self {
        Self {
            id: value.id,
            name: value.name,
            account_type: value.account_type,
            deleted: value.deleted,
            closed: value.closed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesData {
    pub category_groups: Vec<CategoryGroupDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryGroupDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<CategoryDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryDto {
    pub id: String,
    pub name: String,
    pub category_group_id: String,
}

impl From<CategoryGroupDto> for CategoryGroup {
    fn from(value: CategoryGroupDto) -> Self {
        Self {
            id: value.id,
            name: value.name,
            categories: value
                .categories
                .into_iter()
                .map(|category| Category {
                    id: category.id,
                    name: category.name,
                    category_group_id: category.category_group_id,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionsData {
    pub transactions: Vec<TransactionDetailDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionDetailDto {
    pub id: String,
    pub date: String,
    pub amount: i64,
    pub account_id: String,
    pub payee_name: Option<String>,
    pub transfer_account_id: Option<String>,
}

impl From<TransactionDetailDto> for RemoteTransaction {
    fn from(value: TransactionDetailDto) -> Self {
        Self {
            id: value.id,
            account_id: value.account_id,
            date: value.date,
            amount: value.amount,
            payee_name: value.payee_name,
            transfer_account_id: value.transfer_account_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Cleared {
    Cleared,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveTransaction<'a> {
    pub account_id: &'a str,
    pub date: &'a str,
    pub amount: i64,
    pub payee_name: &'a str,
    pub category_id: Option<&'a str>,
    pub memo: Option<&'a str>,
    pub cleared: Cleared,
}

impl<'a> From<&'a NormalizedTransaction> for SaveTransaction<'a> {
    fn from(value: &'a NormalizedTransaction) -> Self {
        Self {
            account_id: &value.account_id,
            date: &value.date,
            amount: value.amount,
            payee_name: &value.payee_name,
            category_id: value.category_id.as_deref(),
            memo: value.memo.as_deref(),
            cleared: Cleared::Cleared,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveTransactionsBody<'a> {
    pub transactions: Vec<SaveTransaction<'a>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveTransactionsData {
    #[serde(default)]
    pub transaction_ids: Vec<String>,
    #[serde(default)]
    pub duplicate_import_ids: Vec<String>,
}

impl From<SaveTransactionsData> for CreationResult {
    fn from(value: SaveTransactionsData) -> Self {
        Self {
            transaction_ids: value.transaction_ids,
            duplicate_import_ids: value.duplicate_import_ids,
        }
    }
}
