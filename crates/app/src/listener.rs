use async_trait::async_trait;
use engine::{Event, EventListener};

/// Renders every bus event as a tracing record.
pub struct TracingListener;

#[async_trait]
impl EventListener for TracingListener {
    async fn on_event(&self, event: &Event) {
        let name = event.name();
        match event {
            Event::ImportProcessStart { start_date } => {
                tracing::info!(event = name, %start_date, "import started");
            }
            Event::ImporterStart(importer) | Event::ImporterProgress(importer) => {
                tracing::info!(event = name, company = %importer.company_key, "{}", importer.message);
            }
            Event::ImporterError { importer, error } => {
                tracing::error!(event = name, company = %importer.company_key, "{error}");
            }
            Event::ImporterEnd {
                importer,
                transactions,
            } => {
                tracing::info!(
                    event = name,
                    company = %importer.company_key,
                    transactions = transactions.len(),
                    "{}",
                    importer.message
                );
            }
            Event::ExporterStart(exporter)
            | Event::ExporterProgress(exporter)
            | Event::ExporterEnd(exporter) => {
                tracing::info!(
                    event = name,
                    destination = %exporter.exporter_name,
                    transactions = exporter.all_transactions.len(),
                    "{}",
                    exporter.message
                );
            }
            Event::ExporterError { exporter, error } => {
                tracing::error!(
                    event = name,
                    destination = %exporter.exporter_name,
                    transactions = exporter.all_transactions.len(),
                    "{error}"
                );
            }
            Event::GeneralError { error } => tracing::error!(event = name, "{error}"),
            Event::Log { message } => tracing::info!(event = name, "{message}"),
            Event::ImportProcessEnd | Event::ExportProcessStart | Event::ExportProcessEnd => {
                tracing::info!(event = name);
            }
        }
    }
}
