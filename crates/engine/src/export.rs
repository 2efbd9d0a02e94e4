//! Fan-out of one import result to every active destination.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use futures::future::join_all;

use crate::{
    AccountStatus, CreationResult, Destination, DestinationName, DestinationsConfig,
    EnrichedTransaction, ExportError, PartialExport, ResultExport,
    events::{Event, EventPublisher, ExporterEvent},
};

/// Raw creation result of every destination that ran, `None` when it had
/// nothing to create.
pub type ExecutionResult = BTreeMap<DestinationName, Option<CreationResult>>;

/// Owns the destination adapters of a run.
pub struct Exporter {
    destinations: Vec<Box<dyn Destination>>,
}

impl Exporter {
    /// Return a builder for `Exporter`. Help to build the struct.
    pub fn builder() -> ExporterBuilder {
        ExporterBuilder::default()
    }

    pub fn destination_names(&self) -> Vec<DestinationName> {
        self.destinations.iter().map(|d| d.name()).collect()
    }

    /// Drops the state every destination gathered, initialization included.
    pub fn reset(&mut self) {
        for destination in &mut self.destinations {
            destination.reset();
        }
    }

    /// Exports `transactions_by_account` to every destination active in
    /// `config`.
    ///
    /// Every run starts from a fresh view of the destinations: what an
    /// earlier run fetched is never reused. Destinations run concurrently
    /// and a failing one never stops the others. When any of them fails the
    /// call returns
    /// [`ExportError::DestinationsFailed`] once all are done, keeping the
    /// results of those that succeeded.
    pub async fn create_transactions_in_external_vendors(
        &mut self,
        config: &DestinationsConfig,
        transactions_by_account: &HashMap<String, Vec<EnrichedTransaction>>,
        start_date: DateTime<Utc>,
        publisher: &dyn EventPublisher,
    ) -> ResultExport<ExecutionResult> {
        publisher.emit(Event::ExportProcessStart).await;
        for destination in &mut self.destinations {
            destination.start_run();
        }

        let all_transactions: Arc<[EnrichedTransaction]> = transactions_by_account
            .values()
            .flatten()
            .cloned()
            .collect();

        let runs = self
            .destinations
            .iter_mut()
            .filter(|destination| config.is_active(destination.name()))
            .map(|destination| {
                let batch = Arc::clone(&all_transactions);
                async move {
                    let name = destination.name();
                    let outcome =
                        run_destination(destination.as_mut(), config, batch, start_date, publisher)
                            .await;
                    (name, outcome)
                }
            });
        let outcomes = join_all(runs).await;

        if outcomes.is_empty() {
            tracing::error!("no active destination configured");
            return Err(ExportError::NoActiveDestination);
        }

        publisher.emit(Event::ExportProcessEnd).await;

        let mut partial = PartialExport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(result) => {
                    partial.succeeded.insert(name, result);
                }
                Err(error) => {
                    partial.errors.insert(name, error);
                }
            }
        }

        if partial.errors.is_empty() {
            Ok(partial.succeeded)
        } else {
            Err(ExportError::DestinationsFailed(partial))
        }
    }
}

async fn run_destination(
    destination: &mut dyn Destination,
    config: &DestinationsConfig,
    batch: Arc<[EnrichedTransaction]>,
    start_date: DateTime<Utc>,
    publisher: &dyn EventPublisher,
) -> ResultExport<Option<CreationResult>> {
    let name = destination.name();

    if let Err(error) = destination.init(config).await {
        tracing::error!("failed to initialize {name}: {error}");
        publisher
            .emit(Event::ExporterError {
                exporter: ExporterEvent::new(name, error.to_string(), batch),
                error: error.clone(),
            })
            .await;
        return Err(error);
    }

    publisher
        .emit(Event::ExporterStart(ExporterEvent::new(
            name,
            "Starting",
            Arc::clone(&batch),
        )))
        .await;

    let result = destination
        .export_transactions(Arc::clone(&batch), start_date, publisher)
        .await?;

    publisher
        .emit(Event::ExporterEnd(
            ExporterEvent::new(name, "Finished", batch).with_status(AccountStatus::Done),
        ))
        .await;
    Ok(result)
}

#[derive(Default)]
pub struct ExporterBuilder {
    destinations: Vec<Box<dyn Destination>>,
}

impl ExporterBuilder {
    pub fn destination(mut self, destination: impl Destination + 'static) -> ExporterBuilder {
        self.destinations.push(Box::new(destination));
        self
    }

    pub fn boxed_destination(mut self, destination: Box<dyn Destination>) -> ExporterBuilder {
        self.destinations.push(destination);
        self
    }

    pub fn build(self) -> Exporter {
        Exporter {
            destinations: self.destinations,
        }
    }
}
