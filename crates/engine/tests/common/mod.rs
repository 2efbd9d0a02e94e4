#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use tokio::sync::mpsc;

use engine::{
    Account, BudgetApi, BudgetApiConnector, BudgetSummary, Category, CategoryGroup,
    CreationResult, DestinationsConfig, EnrichedTransaction, Event, EventBus,
    NormalizedTransaction, RemoteError, RemoteTransaction, SpreadsheetConfig, YnabConfig,
    events::ChannelListener,
};
use uuid::Uuid;

pub const TOKEN: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
pub const BUDGET_ID: &str = "budget-1";

/// Calls and canned answers of the fake YNAB service.
#[derive(Default)]
pub struct FakeState {
    pub existing: Vec<RemoteTransaction>,
    pub category_groups: Vec<CategoryGroup>,
    pub budgets: Vec<BudgetSummary>,
    pub accounts: HashMap<String, Vec<Account>>,
    pub fail_create: Option<RemoteError>,
    pub reject_budgets: bool,
    pub connects: Vec<String>,
    pub transactions_calls: Vec<(String, NaiveDate)>,
    pub category_calls: usize,
    pub created: Vec<Vec<NormalizedTransaction>>,
}

#[derive(Clone, Default)]
pub struct FakeYnab {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeYnab {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().category_groups = vec![CategoryGroup {
            id: "group-1".to_string(),
            name: "Everyday".to_string(),
            categories: vec![
                Category {
                    id: "cat-food".to_string(),
                    name: "Food".to_string(),
                    category_group_id: "group-1".to_string(),
                },
                Category {
                    id: "cat-fuel".to_string(),
                    name: "Fuel".to_string(),
                    category_group_id: "group-1".to_string(),
                },
            ],
        }];
        fake
    }

    pub fn with_existing(self, existing: Vec<RemoteTransaction>) -> Self {
        self.state.lock().unwrap().existing = existing;
        self
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().created.len()
    }

    pub fn created(&self) -> Vec<NormalizedTransaction> {
        self.state
            .lock()
            .unwrap()
            .created
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn connector(&self) -> Arc<dyn BudgetApiConnector> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl BudgetApi for FakeYnab {
    async fn transactions_since(
        &self,
        budget_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<RemoteTransaction>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.transactions_calls.push((budget_id.to_string(), since));
        Ok(state.existing.clone())
    }

    async fn categories(&self, _budget_id: &str) -> Result<Vec<CategoryGroup>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.category_calls += 1;
        Ok(state.category_groups.clone())
    }

    async fn create_transactions(
        &self,
        _budget_id: &str,
        transactions: &[NormalizedTransaction],
    ) -> Result<CreationResult, RemoteError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_create.clone() {
            return Err(err);
        }
        state.created.push(transactions.to_vec());
        Ok(CreationResult {
            transaction_ids: (0..transactions.len())
                .map(|i| format!("created-{i}"))
                .collect(),
            duplicate_import_ids: Vec::new(),
        })
    }

    async fn budgets(&self) -> Result<Vec<BudgetSummary>, RemoteError> {
        let state = self.state.lock().unwrap();
        if state.reject_budgets {
            return Err(RemoteError::with_status(401, "Unauthorized"));
        }
        Ok(state.budgets.clone())
    }

    async fn accounts(&self, budget_id: &str) -> Result<Vec<Account>, RemoteError> {
        let state = self.state.lock().unwrap();
        Ok(state.accounts.get(budget_id).cloned().unwrap_or_default())
    }
}

impl BudgetApiConnector for FakeYnab {
    fn connect(&self, access_token: &str) -> Result<Box<dyn BudgetApi>, RemoteError> {
        self.state
            .lock()
            .unwrap()
            .connects
            .push(access_token.to_string());
        Ok(Box::new(self.clone()))
    }
}

pub fn ynab_config() -> YnabConfig {
    YnabConfig {
        active: true,
        access_token: TOKEN.to_string(),
        budget_id: BUDGET_ID.to_string(),
        account_numbers_to_ynab_account_ids: HashMap::from([
            ("1234".to_string(), "acc-checking".to_string()),
            ("5678".to_string(), "acc-card".to_string()),
        ]),
        max_payee_name_length: None,
    }
}

pub fn spreadsheet_config(path: PathBuf) -> SpreadsheetConfig {
    SpreadsheetConfig {
        active: true,
        path: Some(path),
        account_numbers_to_sheet_accounts: HashMap::from([
            ("1234".to_string(), "Checking".to_string()),
            ("5678".to_string(), "Credit card".to_string()),
        ]),
        max_description_length: None,
    }
}

pub fn ynab_only() -> DestinationsConfig {
    DestinationsConfig {
        ynab: Some(ynab_config()),
        spreadsheet: None,
    }
}

pub fn transaction(account: &str, amount: f64, date: &str, description: &str) -> EnrichedTransaction {
    EnrichedTransaction {
        account_number: account.to_string(),
        charged_amount: amount,
        date: DateTime::parse_from_rfc3339(date).unwrap(),
        description: description.to_string(),
        memo: None,
        category: None,
        identifier: None,
    }
}

pub fn remote(account_id: &str, date: &str, amount: i64, payee: &str) -> RemoteTransaction {
    RemoteTransaction {
        id: Uuid::new_v4().to_string(),
        account_id: account_id.to_string(),
        date: date.to_string(),
        amount,
        payee_name: Some(payee.to_string()),
        transfer_account_id: None,
    }
}

pub fn start_date() -> DateTime<chrono::Utc> {
    DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z")
        .unwrap()
        .to_utc()
}

pub fn bus() -> (EventBus, mpsc::UnboundedReceiver<Event>) {
    let (listener, receiver) = ChannelListener::new();
    let mut bus = EventBus::new();
    bus.subscribe(Arc::new(listener));
    (bus, receiver)
}

pub fn drain(receiver: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

pub fn progress_messages(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::ExporterProgress(progress) => Some(progress.message.clone()),
            _ => None,
        })
        .collect()
}

/// A fresh CSV path under `target/test_sheets`.
pub fn sheet_path() -> PathBuf {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_sheets");
    std::fs::create_dir_all(&root).unwrap();
    root.join(format!("sheet_{}.csv", Uuid::new_v4()))
}
