//! Contract of the remote budget service clients used by the YNAB
//! destination. The HTTP implementation lives in the `ynab_client` crate.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    CategoryGroup, CreationResult, NormalizedTransaction, RemoteError, RemoteTransaction,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetSummary {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_type: String,
    pub deleted: bool,
    pub closed: bool,
}

#[async_trait]
pub trait BudgetApi: Send + Sync {
    /// Every transaction of the budget dated on or after `since`.
    async fn transactions_since(
        &self,
        budget_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<RemoteTransaction>, RemoteError>;

    async fn categories(&self, budget_id: &str) -> Result<Vec<CategoryGroup>, RemoteError>;

    async fn create_transactions(
        &self,
        budget_id: &str,
        transactions: &[NormalizedTransaction],
    ) -> Result<CreationResult, RemoteError>;

    /// Also the cheapest authenticated call, used to check a token.
    async fn budgets(&self) -> Result<Vec<BudgetSummary>, RemoteError>;

    async fn accounts(&self, budget_id: &str) -> Result<Vec<Account>, RemoteError>;
}

/// Builds an authenticated [`BudgetApi`] for an access token.
pub trait BudgetApiConnector: Send + Sync {
    fn connect(&self, access_token: &str) -> Result<Box<dyn BudgetApi>, RemoteError>;
}
