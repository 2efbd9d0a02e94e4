//! YNAB budget destination.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;

use super::{
    Destination, DestinationName, InitState, emit_error, emit_progress, select_new_transactions,
};
use crate::{
    BudgetApi, BudgetApiConnector, BudgetSummary, CategoryIndex, CreationResult,
    DestinationsConfig, EnrichedTransaction, ExportError, INITIAL_YNAB_ACCESS_TOKEN,
    RemoteError, RemoteStateCache, ResultExport, YnabConfig,
    events::EventPublisher,
    normalize::{DEFAULT_MAX_DESCRIPTION_LENGTH, NormalizeOptions, normalize_all},
};

pub const YNAB_DATE_FORMAT: &str = "%Y-%m-%d";
/// YNAB amounts are in milliunits.
pub const YNAB_AMOUNT_SCALE: i64 = 1000;
pub const YNAB_ACCESS_TOKEN_LENGTH: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct YnabFinancialAccount {
    pub id: String,
    pub name: String,
    pub account_type: String,
    pub budget_id: String,
    pub active: bool,
}

/// What the account has in YNAB, used to fill the account mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountDetails {
    pub budgets: Vec<BudgetSummary>,
    pub accounts: Vec<YnabFinancialAccount>,
    pub categories: Vec<String>,
}

struct Session {
    config: YnabConfig,
    api: Box<dyn BudgetApi>,
}

pub struct YnabDestination {
    connector: Arc<dyn BudgetApiConnector>,
    state: InitState<Session>,
    categories: Option<CategoryIndex>,
    remote_cache: RemoteStateCache,
    account_details: Option<AccountDetails>,
}

impl YnabDestination {
    pub fn new(connector: Arc<dyn BudgetApiConnector>) -> Self {
        Self {
            connector,
            state: InitState::default(),
            categories: None,
            remote_cache: RemoteStateCache::new(),
            account_details: None,
        }
    }

    async fn create_transactions(
        &mut self,
        batch: &Arc<[EnrichedTransaction]>,
        start_date: DateTime<Utc>,
        publisher: &dyn EventPublisher,
    ) -> ResultExport<Option<CreationResult>> {
        let session = self.state.active(DestinationName::Ynab)?;
        let budget_id = session.config.budget_id.as_str();
        let api = session.api.as_ref();

        let categories = match self.categories.take() {
            Some(index) => index,
            None => {
                tracing::debug!("loading ynab categories of budget {budget_id}");
                CategoryIndex::from_groups(api.categories(budget_id).await?)
            }
        };
        let categories = &*self.categories.insert(categories);

        let options = NormalizeOptions {
            amount_scale: YNAB_AMOUNT_SCALE,
            date_format: YNAB_DATE_FORMAT,
            max_description_length: session
                .config
                .max_payee_name_length
                .unwrap_or(DEFAULT_MAX_DESCRIPTION_LENGTH),
            accounts: &session.config.account_numbers_to_ynab_account_ids,
        };
        let candidates = normalize_all(batch, &options, categories)?;

        let existing = self
            .remote_cache
            .get_or_fetch(start_date, || async move {
                api.transactions_since(budget_id, start_date.date_naive())
                    .await
                    .map_err(ExportError::from)
            })
            .await?;
        let to_create = select_new_transactions(
            candidates,
            &existing,
            YNAB_AMOUNT_SCALE,
            YNAB_DATE_FORMAT,
            Utc::now(),
        );

        if to_create.is_empty() {
            emit_progress(
                publisher,
                DestinationName::Ynab,
                batch,
                "All transactions already exist in ynab. Doing nothing.",
            )
            .await;
            return Ok(None);
        }

        emit_progress(
            publisher,
            DestinationName::Ynab,
            batch,
            format!("Creating {} transactions in ynab", to_create.len()),
        )
        .await;
        let result = api.create_transactions(budget_id, &to_create).await?;
        tracing::info!("created {} transactions in ynab", result.created());
        Ok(Some(result))
    }

    /// Budgets, accounts and category names of the YNAB account, fetched once
    /// for the lifetime of the destination.
    pub async fn account_details(
        &mut self,
        config: &DestinationsConfig,
    ) -> ResultExport<AccountDetails> {
        if let Some(details) = &self.account_details {
            return Ok(details.clone());
        }

        if !config.is_active(DestinationName::Ynab) {
            return Err(ExportError::InvalidConfig(
                "ynab is not active".to_string(),
            ));
        }
        self.init(config).await?;
        let session = self.state.active(DestinationName::Ynab)?;
        let api = session.api.as_ref();

        let budgets = api.budgets().await?;
        let accounts = try_join_all(budgets.iter().map(|budget| async move {
            let accounts = api.accounts(&budget.id).await?;
            Ok::<_, RemoteError>(
                accounts
                    .into_iter()
                    .map(|account| YnabFinancialAccount {
                        active: !account.deleted && !account.closed,
                        id: account.id,
                        name: account.name,
                        account_type: account.account_type,
                        budget_id: budget.id.clone(),
                    })
                    .collect::<Vec<_>>(),
            )
        }))
        .await?
        .into_iter()
        .flatten()
        .collect();
        let categories = api
            .categories(&session.config.budget_id)
            .await?
            .into_iter()
            .flat_map(|group| group.categories)
            .map(|category| category.name)
            .collect();

        let details = AccountDetails {
            budgets,
            accounts,
            categories,
        };
        self.account_details = Some(details.clone());
        Ok(details)
    }

    /// Checks a candidate access token with a lightweight authenticated call.
    /// Malformed tokens and any remote failure count as invalid.
    pub async fn is_access_token_valid(&self, access_token: &str) -> bool {
        if access_token.len() != YNAB_ACCESS_TOKEN_LENGTH {
            return false;
        }
        let api = match self.connector.connect(access_token) {
            Ok(api) => api,
            Err(err) => {
                tracing::debug!("cannot build ynab client: {err}");
                return false;
            }
        };
        match api.budgets().await {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!("ynab rejected the access token: {err}");
                false
            }
        }
    }
}

#[async_trait]
impl Destination for YnabDestination {
    fn name(&self) -> DestinationName {
        DestinationName::Ynab
    }

    async fn init(&mut self, config: &DestinationsConfig) -> ResultExport<()> {
        if self.state.is_initialized() {
            return Ok(());
        }

        let ynab = match &config.ynab {
            Some(ynab) if ynab.active => ynab.clone(),
            _ => return Ok(()),
        };
        if ynab.access_token == INITIAL_YNAB_ACCESS_TOKEN {
            return Err(ExportError::MissingCredential(
                "You need to set the ynab access token in the config".to_string(),
            ));
        }

        let api = self.connector.connect(&ynab.access_token)?;
        tracing::info!("ynab destination ready for budget {}", ynab.budget_id);
        self.state = InitState::Active(Session { config: ynab, api });
        Ok(())
    }

    async fn export_transactions(
        &mut self,
        batch: Arc<[EnrichedTransaction]>,
        start_date: DateTime<Utc>,
        publisher: &dyn EventPublisher,
    ) -> ResultExport<Option<CreationResult>> {
        match self.create_transactions(&batch, start_date, publisher).await {
            Ok(result) => Ok(result),
            Err(error) => {
                emit_error(publisher, DestinationName::Ynab, batch, &error).await;
                Err(error)
            }
        }
    }

    fn start_run(&mut self) {
        self.categories = None;
        self.remote_cache.clear();
    }

    fn reset(&mut self) {
        self.start_run();
        self.state = InitState::Uninitialized;
    }
}
