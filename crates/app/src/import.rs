//! File based import: reads the JSON document written by the scraper and
//! reports the import on the event bus.

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use engine::{
    EnrichedTransaction, Event, EventPublisher,
    events::{ImportProgress, ImporterEvent, relay_import_progress},
};
use tokio::sync::mpsc;

use crate::error::Result;

pub type TransactionsByCompany = HashMap<String, Vec<EnrichedTransaction>>;

/// Midnight UTC, `days_back` days ago.
pub fn default_start_date(days_back: u64) -> DateTime<Utc> {
    let day = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(days_back))
        .unwrap_or(NaiveDate::MIN);
    day.and_time(NaiveTime::MIN).and_utc()
}

pub async fn load_transactions(
    path: &Path,
    start_date: DateTime<Utc>,
    publisher: &dyn EventPublisher,
) -> Result<TransactionsByCompany> {
    publisher.emit(Event::ImportProcessStart { start_date }).await;

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) => {
            publisher
                .emit(Event::GeneralError {
                    error: format!("cannot read {}: {err}", path.display()),
                })
                .await;
            return Err(err.into());
        }
    };

    import_document(&content, start_date, publisher).await
}

pub(crate) async fn import_document(
    content: &str,
    start_date: DateTime<Utc>,
    publisher: &dyn EventPublisher,
) -> Result<TransactionsByCompany> {
    let document: TransactionsByCompany = match serde_json::from_str(content) {
        Ok(document) => document,
        Err(err) => {
            publisher
                .emit(Event::GeneralError {
                    error: format!("invalid transactions document: {err}"),
                })
                .await;
            return Err(err.into());
        }
    };

    let (progress, receiver) = mpsc::channel(16);
    let ((), imported) = tokio::join!(
        relay_import_progress(receiver, publisher),
        import_companies(document, start_date, progress, publisher),
    );

    publisher.emit(Event::ImportProcessEnd).await;
    Ok(imported)
}

async fn import_companies(
    document: TransactionsByCompany,
    start_date: DateTime<Utc>,
    progress: mpsc::Sender<ImportProgress>,
    publisher: &dyn EventPublisher,
) -> TransactionsByCompany {
    let mut imported = HashMap::with_capacity(document.len());

    for (company_key, transactions) in document {
        let importer = ImporterEvent {
            id: company_key.clone(),
            name: company_key.clone(),
            company_key: company_key.clone(),
            message: "Starting".to_string(),
        };
        publisher.emit(Event::ImporterStart(importer.clone())).await;

        let total = transactions.len();
        let recent: Vec<_> = transactions
            .into_iter()
            .filter(|transaction| transaction.date.to_utc() >= start_date)
            .collect();
        let message = format!(
            "{} of {total} transactions since {}",
            recent.len(),
            start_date.date_naive()
        );
        if progress
            .send(ImportProgress {
                company_key: company_key.clone(),
                message,
            })
            .await
            .is_err()
        {
            tracing::debug!("import progress relay stopped");
        }
        // Lets the relay publish the progress before the importer ends.
        tokio::task::yield_now().await;

        publisher
            .emit(Event::ImporterEnd {
                importer: ImporterEvent {
                    message: "Finished".to_string(),
                    ..importer
                },
                transactions: recent.clone(),
            })
            .await;
        imported.insert(company_key, recent);
    }

    imported
}
