//! Lifecycle and progress notifications of an import/export run.
//!
//! Components publish [`Event`]s through an [`EventPublisher`] and await the
//! call before moving on, so sequential emits are delivered in order. The
//! [`EventBus`] forwards every event to its listeners one after the other; it
//! keeps no state beyond the listener list.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::{DestinationName, EnrichedTransaction, ExportError};

/// Final state of an importer or exporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountStatus {
    Done,
    Error,
}

/// Payload shared by the importer events.
#[derive(Clone, Debug)]
pub struct ImporterEvent {
    pub id: String,
    pub name: String,
    pub company_key: String,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct ExporterEvent {
    pub exporter_name: DestinationName,
    pub message: String,
    pub all_transactions: Arc<[EnrichedTransaction]>,
    pub status: Option<AccountStatus>,
}

impl ExporterEvent {
    pub fn new(
        exporter_name: DestinationName,
        message: impl Into<String>,
        all_transactions: Arc<[EnrichedTransaction]>,
    ) -> Self {
        Self {
            exporter_name,
            message: message.into(),
            all_transactions,
            status: None,
        }
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Clone, Debug)]
pub enum Event {
    ImportProcessStart {
        start_date: DateTime<Utc>,
    },
    ImporterStart(ImporterEvent),
    ImporterProgress(ImporterEvent),
    ImporterError {
        importer: ImporterEvent,
        error: String,
    },
    ImporterEnd {
        importer: ImporterEvent,
        transactions: Vec<EnrichedTransaction>,
    },
    ImportProcessEnd,
    ExportProcessStart,
    ExporterStart(ExporterEvent),
    ExporterProgress(ExporterEvent),
    ExporterError {
        exporter: ExporterEvent,
        error: ExportError,
    },
    ExporterEnd(ExporterEvent),
    ExportProcessEnd,
    GeneralError {
        error: String,
    },
    Log {
        message: String,
    },
}

impl Event {
    /// Stable event name, as consumers key on it.
    pub fn name(&self) -> &'static str {
        match self {
            Event::ImportProcessStart { .. } => "IMPORT_PROCESS_START",
            Event::ImporterStart(_) => "IMPORTER_START",
            Event::ImporterProgress(_) => "IMPORTER_PROGRESS",
            Event::ImporterError { .. } => "IMPORTER_ERROR",
            Event::ImporterEnd { .. } => "IMPORTER_END",
            Event::ImportProcessEnd => "IMPORT_PROCESS_END",
            Event::ExportProcessStart => "EXPORT_PROCESS_START",
            Event::ExporterStart(_) => "EXPORTER_START",
            Event::ExporterProgress(_) => "EXPORTER_PROGRESS",
            Event::ExporterError { .. } => "EXPORTER_ERROR",
            Event::ExporterEnd(_) => "EXPORTER_END",
            Event::ExportProcessEnd => "EXPORT_PROCESS_END",
            Event::GeneralError { .. } => "GENERAL_ERROR",
            Event::Log { .. } => "LOG",
        }
    }
}

/// Publish-only side of the bus, the only thing components get to see.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn emit(&self, event: Event);
}

#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_event(&self, event: &Event);
}

/// Forwards events into an unbounded channel.
#[derive(Clone, Debug)]
pub struct ChannelListener {
    sender: mpsc::UnboundedSender<Event>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventListener for ChannelListener {
    async fn on_event(&self, event: &Event) {
        if self.sender.send(event.clone()).is_err() {
            tracing::debug!("event receiver dropped, discarding {}", event.name());
        }
    }
}

#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn emit(&self, event: Event) {
        for listener in &self.listeners {
            listener.on_event(&event).await;
        }
    }
}

/// Progress message pushed by an import collaborator.
#[derive(Clone, Debug)]
pub struct ImportProgress {
    pub company_key: String,
    pub message: String,
}

/// Relays import progress messages to `publisher` until every sender is
/// dropped.
pub async fn relay_import_progress(
    mut receiver: mpsc::Receiver<ImportProgress>,
    publisher: &dyn EventPublisher,
) {
    while let Some(progress) = receiver.recv().await {
        publisher
            .emit(Event::ImporterProgress(ImporterEvent {
                id: progress.company_key.clone(),
                name: progress.company_key.clone(),
                company_key: progress.company_key,
                message: progress.message,
            }))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bus_delivers_in_emit_order() {
        let (listener, mut rx) = ChannelListener::new();
        let mut bus = EventBus::new();
        bus.subscribe(Arc::new(listener));

        bus.emit(Event::ExportProcessStart).await;
        bus.emit(Event::Log {
            message: "hello".to_string(),
        })
        .await;
        bus.emit(Event::ExportProcessEnd).await;

        let names = [
            rx.recv().await.unwrap().name(),
            rx.recv().await.unwrap().name(),
            rx.recv().await.unwrap().name(),
        ];
        assert_eq!(names, ["EXPORT_PROCESS_START", "LOG", "EXPORT_PROCESS_END"]);
    }

    #[tokio::test]
    async fn every_listener_sees_the_event() {
        let (first, mut first_rx) = ChannelListener::new();
        let (second, mut second_rx) = ChannelListener::new();
        let mut bus = EventBus::new();
        bus.subscribe(Arc::new(first));
        bus.subscribe(Arc::new(second));
        assert_eq!(bus.listener_count(), 2);

        bus.emit(Event::ImportProcessEnd).await;

        assert!(matches!(first_rx.try_recv(), Ok(Event::ImportProcessEnd)));
        assert!(matches!(second_rx.try_recv(), Ok(Event::ImportProcessEnd)));
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_stop_emit() {
        let (listener, rx) = ChannelListener::new();
        drop(rx);
        let mut bus = EventBus::new();
        bus.subscribe(Arc::new(listener));
        bus.emit(Event::ExportProcessStart).await;
    }

    #[tokio::test]
    async fn relays_import_progress_until_closed() {
        let (listener, mut events) = ChannelListener::new();
        let mut bus = EventBus::new();
        bus.subscribe(Arc::new(listener));

        let (tx, rx) = mpsc::channel(4);
        tx.send(ImportProgress {
            company_key: "leumi".to_string(),
            message: "LOGGING_IN".to_string(),
        })
        .await
        .unwrap();
        drop(tx);

        relay_import_progress(rx, &bus).await;

        match events.try_recv().unwrap() {
            Event::ImporterProgress(event) => {
                assert_eq!(event.company_key, "leumi");
                assert_eq!(event.message, "LOGGING_IN");
            }
            other => panic!("unexpected event {}", other.name()),
        }
        assert!(events.try_recv().is_err());
    }
}
