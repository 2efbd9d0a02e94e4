//! Spreadsheet destination backed by a local CSV file.
//!
//! Every exported transaction is a row; the rows already in the file are the
//! remote state. Category labels are written as they are.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Destination, DestinationName, InitState, emit_error, emit_progress, select_new_transactions,
};
use crate::{
    CreationResult, DestinationsConfig, EnrichedTransaction, ExportError, NormalizedTransaction,
    RemoteError, RemoteStateCache, RemoteTransaction, ResultExport, SpreadsheetConfig,
    events::EventPublisher,
    normalize::{
        CategoryLabel, DEFAULT_MAX_DESCRIPTION_LENGTH, NormalizeOptions, normalize_all,
        scale_amount,
    },
};

pub const SPREADSHEET_DATE_FORMAT: &str = "%d/%m/%Y";
/// Amounts are written with two decimals.
pub const SPREADSHEET_AMOUNT_SCALE: i64 = 100;

#[derive(Debug, Serialize, Deserialize)]
struct SheetRow {
    id: String,
    date: String,
    account: String,
    amount: String,
    description: String,
    category: Option<String>,
    memo: Option<String>,
}

impl SheetRow {
    fn from_transaction(transaction: &NormalizedTransaction) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date: transaction.date.clone(),
            account: transaction.account_id.clone(),
            amount: format_amount(transaction.amount),
            description: transaction.payee_name.clone(),
            category: transaction.category_id.clone(),
            memo: transaction.memo.clone(),
        }
    }

    fn into_remote(self) -> Option<RemoteTransaction> {
        let amount = self.amount.trim().parse::<f64>().ok()?;
        Some(RemoteTransaction {
            id: self.id,
            account_id: self.account,
            date: self.date,
            amount: scale_amount(amount, SPREADSHEET_AMOUNT_SCALE),
            payee_name: Some(self.description),
            transfer_account_id: None,
        })
    }
}

/// Formats minor units as a decimal with two digits, e.g. `-1205` as
/// `-12.05`.
fn format_amount(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    let scale = SPREADSHEET_AMOUNT_SCALE.unsigned_abs();
    format!("{sign}{}.{:02}", abs / scale, abs % scale)
}

struct Sheet {
    path: PathBuf,
    config: SpreadsheetConfig,
}

#[derive(Default)]
pub struct SpreadsheetDestination {
    state: InitState<Sheet>,
    remote_cache: RemoteStateCache,
}

impl SpreadsheetDestination {
    pub fn new() -> Self {
        Self::default()
    }

    async fn create_transactions(
        &mut self,
        batch: &Arc<[EnrichedTransaction]>,
        start_date: DateTime<Utc>,
        publisher: &dyn EventPublisher,
    ) -> ResultExport<Option<CreationResult>> {
        let sheet = self.state.active(DestinationName::Spreadsheet)?;

        let options = NormalizeOptions {
            amount_scale: SPREADSHEET_AMOUNT_SCALE,
            date_format: SPREADSHEET_DATE_FORMAT,
            max_description_length: sheet
                .config
                .max_description_length
                .unwrap_or(DEFAULT_MAX_DESCRIPTION_LENGTH),
            accounts: &sheet.config.account_numbers_to_sheet_accounts,
        };
        let candidates = normalize_all(batch, &options, &CategoryLabel)?;

        let path = sheet.path.clone();
        let existing = self
            .remote_cache
            .get_or_fetch(start_date, || async move {
                let since = start_date.date_naive();
                match tokio::task::spawn_blocking(move || read_rows_since(&path, since)).await {
                    Ok(rows) => rows.map_err(ExportError::from),
                    Err(err) => Err(ExportError::Remote(RemoteError::new(format!(
                        "spreadsheet reader panicked: {err}"
                    )))),
                }
            })
            .await?;
        let to_create = select_new_transactions(
            candidates,
            &existing,
            SPREADSHEET_AMOUNT_SCALE,
            SPREADSHEET_DATE_FORMAT,
            Utc::now(),
        );

        if to_create.is_empty() {
            emit_progress(
                publisher,
                DestinationName::Spreadsheet,
                batch,
                "All transactions already exist in the spreadsheet. Doing nothing.",
            )
            .await;
            return Ok(None);
        }

        emit_progress(
            publisher,
            DestinationName::Spreadsheet,
            batch,
            format!("Creating {} transactions in the spreadsheet", to_create.len()),
        )
        .await;
        let rows: Vec<SheetRow> = to_create.iter().map(SheetRow::from_transaction).collect();
        let path = sheet.path.clone();
        let result = tokio::task::spawn_blocking(move || append_rows(&path, rows))
            .await
            .map_err(|err| RemoteError::new(format!("spreadsheet writer panicked: {err}")))??;
        tracing::info!(
            "appended {} rows to {}",
            result.created(),
            sheet.path.display()
        );
        Ok(Some(result))
    }
}

fn read_rows_since(path: &Path, since: NaiveDate) -> Result<Vec<RemoteTransaction>, RemoteError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let mut transactions = Vec::new();
    for row in reader.deserialize::<SheetRow>() {
        let row = row.map_err(csv_error)?;
        match NaiveDate::parse_from_str(&row.date, SPREADSHEET_DATE_FORMAT) {
            Ok(date) if date < since => continue,
            Ok(_) => {}
            Err(_) => {
                tracing::warn!("skipping spreadsheet row {} with date {:?}", row.id, row.date);
                continue;
            }
        }
        match row.into_remote() {
            Some(transaction) => transactions.push(transaction),
            None => tracing::warn!("skipping spreadsheet row with an invalid amount"),
        }
    }
    Ok(transactions)
}

fn append_rows(path: &Path, rows: Vec<SheetRow>) -> Result<CreationResult, RemoteError> {
    let is_new = std::fs::metadata(path).map_or(true, |meta| meta.len() == 0);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| RemoteError::new(format!("{}: {err}", path.display())))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(is_new)
        .from_writer(file);

    let mut transaction_ids = Vec::with_capacity(rows.len());
    for row in rows {
        writer.serialize(&row).map_err(csv_error)?;
        transaction_ids.push(row.id);
    }
    writer
        .flush()
        .map_err(|err| RemoteError::new(format!("{}: {err}", path.display())))?;

    Ok(CreationResult {
        transaction_ids,
        duplicate_import_ids: Vec::new(),
    })
}

fn csv_error(err: csv::Error) -> RemoteError {
    RemoteError::new(format!("spreadsheet error: {err}"))
}

#[async_trait]
impl Destination for SpreadsheetDestination {
    fn name(&self) -> DestinationName {
        DestinationName::Spreadsheet
    }

    async fn init(&mut self, config: &DestinationsConfig) -> ResultExport<()> {
        if self.state.is_initialized() {
            return Ok(());
        }

        let spreadsheet = match &config.spreadsheet {
            Some(spreadsheet) if spreadsheet.active => spreadsheet.clone(),
            _ => return Ok(()),
        };
        let path = spreadsheet
            .path
            .clone()
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| ExportError::InvalidConfig("spreadsheet path is not set".to_string()))?;

        tracing::info!("spreadsheet destination writing to {}", path.display());
        self.state = InitState::Active(Sheet {
            path,
            config: spreadsheet,
        });
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
                emit_error(publisher, DestinationName::Spreadsheet, batch, &error).await;
                Err(error)
            }
        }
    }

    fn start_run(&mut self) {
        self.remote_cache.clear();
    }

    fn reset(&mut self) {
        self.start_run();
        self.state = InitState::Uninitialized;
    }
}
