//! HTTP client for the YNAB API (v1).
//!
//! [`YnabClient`] implements the engine's [`BudgetApi`] and [`HttpConnector`]
//! hands one out per access token.

use async_trait::async_trait;
use chrono::NaiveDate;
use engine::{
    Account, BudgetApi, BudgetApiConnector, BudgetSummary, CategoryGroup, CreationResult,
    NormalizedTransaction, RemoteError, RemoteTransaction,
};
use reqwest::{Client, RequestBuilder, StatusCode, header};
use serde::de::DeserializeOwned;

use types::{
    AccountsData, BudgetsData, CategoriesData, Envelope, ErrorBody, SaveTransaction,
    SaveTransactionsBody, SaveTransactionsData, TransactionsData,
};

mod types;

pub const DEFAULT_BASE_URL: &str = "https://api.youneedabudget.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid access token")]
    InvalidToken,
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
}

impl From<ClientError> for RemoteError {
    fn from(value: ClientError) -> Self {
        match &value {
            ClientError::Server { status, message } => {
                RemoteError::with_status(status.as_u16(), message.clone())
            }
            ClientError::Network(err) => match err.status() {
                Some(status) => RemoteError::with_status(status.as_u16(), value.to_string()),
                None => RemoteError::new(value.to_string()),
            },
            ClientError::InvalidToken => RemoteError::new(value.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct YnabClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl YnabClient {
    pub fn new(client: Client, base_url: impl Into<String>, access_token: &str) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            access_token: access_token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.access_token)
            .header(header::ACCEPT, "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = self.authorized(req).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<Envelope<T>>().await?.data);
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => format!(
                "{} ({}): {}",
                body.error.name, body.error.id, body.error.detail
            ),
            Err(_) => "server error".to_string(),
        };
        tracing::debug!("ynab answered {status}: {message}");
        Err(ClientError::Server { status, message })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post_json<TReq: serde::Serialize + ?Sized, TResp: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TResp, ClientError> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    pub async fn list_budgets(&self) -> Result<Vec<BudgetSummary>, ClientError> {
        let data: BudgetsData = self.get_json("/budgets").await?;
        Ok(data.budgets.into_iter().map(BudgetSummary::from).collect())
    }

    pub async fn list_accounts(&self, budget_id: &str) -> Result<Vec<Account>, ClientError> {
        let data: AccountsData = self
            .get_json(&format!("/budgets/{budget_id}/accounts"))
            .await?;
        Ok(data.accounts.into_iter().map(Account::from).collect())
    }

    pub async fn list_categories(
        &self,
        budget_id: &str,
    ) -> Result<Vec<CategoryGroup>, ClientError> {
        let data: CategoriesData = self
            .get_json(&format!("/budgets/{budget_id}/categories"))
            .await?;
        Ok(data
            .category_groups
            .into_iter()
            .map(CategoryGroup::from)
            .collect())
    }

    pub async fn list_transactions(
        &self,
        budget_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<RemoteTransaction>, ClientError> {
        let data: TransactionsData = self
            .get_json(&format!(
                "/budgets/{budget_id}/transactions?since_date={}",
                since.format("%Y-%m-%d")
            ))
            .await?;
        Ok(data
            .transactions
            .into_iter()
            .map(RemoteTransaction::from)
            .collect())
    }

    pub async fn save_transactions(
        &self,
        budget_id: &str,
        transactions: &[NormalizedTransaction],
    ) -> Result<CreationResult, ClientError> {
        let body = SaveTransactionsBody {
            transactions: transactions.iter().map(SaveTransaction::from).collect(),
        };
        let data: SaveTransactionsData = self
            .post_json(&format!("/budgets/{budget_id}/transactions"), &body)
            .await?;
        Ok(data.into())
    }
}

#[async_trait]
impl BudgetApi for YnabClient {
    async fn transactions_since(
        &self,
        budget_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<RemoteTransaction>, RemoteError> {
        Ok(self.list_transactions(budget_id, since).await?)
    }

    async fn categories(&self, budget_id: &str) -> Result<Vec<CategoryGroup>, RemoteError> {
        Ok(self.list_categories(budget_id).await?)
    }

    async fn create_transactions(
        &self,
        budget_id: &str,
        transactions: &[NormalizedTransaction],
    ) -> Result<CreationResult, RemoteError> {
        Ok(self.save_transactions(budget_id, transactions).await?)
    }

    async fn budgets(&self) -> Result<Vec<BudgetSummary>, RemoteError> {
        Ok(self.list_budgets().await?)
    }

    async fn accounts(&self, budget_id: &str) -> Result<Vec<Account>, RemoteError> {
        Ok(self.list_accounts(budget_id).await?)
    }
}

/// Shares one connection pool between every client it creates.
#[derive(Clone, Debug)]
pub struct HttpConnector {
    client: Client,
    base_url: String,
}

impl HttpConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl BudgetApiConnector for HttpConnector {
    fn connect(&self, access_token: &str) -> Result<Box<dyn BudgetApi>, RemoteError> {
        if access_token.trim().is_empty()
            || header::HeaderValue::from_str(&format!("Bearer {access_token}")).is_err()
        {
            return Err(ClientError::InvalidToken.into());
        }
        Ok(Box::new(YnabClient::new(
            self.client.clone(),
            self.base_url.clone(),
            access_token,
        )))
    }
}
