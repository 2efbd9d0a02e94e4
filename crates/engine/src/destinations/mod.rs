//! Destinations transactions are exported to.
//!
//! Every destination implements [`Destination`]; the exporter only talks to
//! that trait. A destination owns its remote-state cache and category index,
//! nothing is shared between two destinations.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::{
    CreationResult, DestinationsConfig, EnrichedTransaction, ExportError, NormalizedTransaction,
    RemoteTransaction, ResultExport,
    dedup::filter_new_transactions,
    events::{Event, EventPublisher, ExporterEvent},
};

pub use spreadsheet::SpreadsheetDestination;
pub use ynab::{AccountDetails, YnabDestination, YnabFinancialAccount};

pub mod spreadsheet;
pub mod ynab;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DestinationName {
    Ynab,
    Spreadsheet,
}

impl DestinationName {
    pub fn as_str(self) -> &'static str {
        match self {
            DestinationName::Ynab => "ynab",
            DestinationName::Spreadsheet => "spreadsheet",
        }
    }
}

impl fmt::Display for DestinationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait Destination: Send {
    fn name(&self) -> DestinationName;

    /// Reads the destination section of `config`. Calling it again once
    /// initialized does nothing; an inactive destination initializes to a
    /// no-op.
    async fn init(&mut self, config: &DestinationsConfig) -> ResultExport<()>;

    /// Creates the transactions of `batch` the destination does not hold yet.
    ///
    /// Returns `None` when there was nothing to create. Failures are reported
    /// with an [`Event::ExporterError`] before being returned.
    async fn export_transactions(
        &mut self,
        batch: Arc<[EnrichedTransaction]>,
        start_date: DateTime<Utc>,
        publisher: &dyn EventPublisher,
    ) -> ResultExport<Option<CreationResult>>;

    /// Forgets the remote state and categories fetched by the previous run.
    /// The initialization is kept.
    fn start_run(&mut self);

    /// Forgets everything learned during a run, initialization included.
    fn reset(&mut self);
}

/// Initialization state of a destination, `T` being what an active
/// destination needs to talk to its store.
#[derive(Debug)]
pub(crate) enum InitState<T> {
    Uninitialized,
    Active(T),
}

impl<T> Default for InitState<T> {
    fn default() -> Self {
        InitState::Uninitialized
    }
}

impl<T> InitState<T> {
    pub(crate) fn is_initialized(&self) -> bool {
        !matches!(self, InitState::Uninitialized)
    }

    pub(crate) fn active(&self, name: DestinationName) -> ResultExport<&T> {
        match self {
            InitState::Active(session) => Ok(session),
            _ => Err(ExportError::NotInitialized(name.to_string())),
        }
    }
}

/// Drops the transactions dated today-or-later than `now` and those already
/// present in `existing`.
pub(crate) fn select_new_transactions(
    candidates: Vec<NormalizedTransaction>,
    existing: &[RemoteTransaction],
    amount_scale: i64,
    date_format: &str,
    now: DateTime<Utc>,
) -> Vec<NormalizedTransaction> {
    let past: Vec<_> = candidates
        .into_iter()
        .filter(|transaction| is_before(&transaction.date, date_format, now))
        .collect();
    filter_new_transactions(past, existing, amount_scale)
}

/// `true` if the start of the calendar day `date` is before `now`.
pub(crate) fn is_before(date: &str, date_format: &str, now: DateTime<Utc>) -> bool {
    NaiveDate::parse_from_str(date, date_format)
        .map(|day| day.and_time(NaiveTime::MIN).and_utc() < now)
        .unwrap_or(false)
}

pub(crate) async fn emit_progress(
    publisher: &dyn EventPublisher,
    name: DestinationName,
    batch: &Arc<[EnrichedTransaction]>,
    message: impl Into<String>,
) {
    publisher
        .emit(Event::ExporterProgress(ExporterEvent::new(
            name,
            message,
            Arc::clone(batch),
        )))
        .await;
}

pub(crate) async fn emit_error(
    publisher: &dyn EventPublisher,
    name: DestinationName,
    batch: Arc<[EnrichedTransaction]>,
    error: &ExportError,
) {
    tracing::warn!("{name} export failed: {error}");
    publisher
        .emit(Event::ExporterError {
            exporter: ExporterEvent::new(name, error.to_string(), batch),
            error: error.clone(),
        })
        .await;
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn candidate(date: &str) -> NormalizedTransaction {
        NormalizedTransaction {
            account_id: "acc".to_string(),
            date: date.to_string(),
            amount: -100,
            payee_name: "Shop".to_string(),
            category_id: None,
            memo: None,
        }
    }

    #[test]
    fn today_is_before_now_but_tomorrow_is_not() {
        let now = Utc.with_ymd_and_hms(2021, 6, 10, 8, 0, 0).unwrap();
        assert!(is_before("2021-06-10", "%Y-%m-%d", now));
        assert!(is_before("2021-06-09", "%Y-%m-%d", now));
        assert!(!is_before("2021-06-11", "%Y-%m-%d", now));
        assert!(!is_before("not a date", "%Y-%m-%d", now));
    }

    #[test]
    fn future_transactions_are_never_selected() {
        let now = Utc.with_ymd_and_hms(2021, 6, 10, 8, 0, 0).unwrap();
        let selected = select_new_transactions(
            vec![candidate("2021-06-01"), candidate("2021-07-01")],
            &[],
            1000,
            "%Y-%m-%d",
            now,
        );
        assert_eq!(selected, vec![candidate("2021-06-01")]);
    }

    #[test]
    fn only_an_active_state_is_initialized() {
        let state: InitState<()> = InitState::default();
        assert!(!state.is_initialized());
        assert_eq!(
            state.active(DestinationName::Ynab).unwrap_err(),
            ExportError::NotInitialized("ynab".to_string())
        );
        assert!(InitState::Active(()).is_initialized());
    }
}
