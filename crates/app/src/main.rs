use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use engine::{
    Event, EventBus, EventPublisher, Exporter, SpreadsheetDestination, YnabDestination,
};
use ynab_client::HttpConnector;

use crate::{
    error::{AppError, Result},
    listener::TracingListener,
    settings::Settings,
};

mod error;
mod import;
mod listener;
mod settings;

#[derive(Debug, Parser)]
#[command(name = "budget_sync", about = "Exports scraped bank transactions to YNAB and a spreadsheet")]
struct Cli {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the imported transactions that the destinations do not hold yet.
    Export {
        /// First day to reconcile (YYYY-MM-DD). Defaults to `import.days_back` days ago.
        #[arg(long)]
        start_date: Option<NaiveDate>,
    },
    /// Print the budgets, accounts and categories of the YNAB account.
    Accounts,
    /// Check whether a YNAB access token is accepted.
    CheckToken { token: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "budget_sync={level},engine={level},ynab_client={level}",
            level = settings.app.level
        ))
        .init();

    let connector = Arc::new(HttpConnector::default());
    match cli.command {
        Command::Export { start_date } => export(&settings, connector, start_date).await,
        Command::Accounts => {
            let details = YnabDestination::new(connector)
                .account_details(&settings.destinations)
                .await?;
            for budget in &details.budgets {
                println!("budget {} ({})", budget.name, budget.id);
                for account in details.accounts.iter().filter(|a| a.budget_id == budget.id) {
                    let state = if account.active { "active" } else { "closed" };
                    println!(
                        "  {} [{}] {} - {state}",
                        account.name, account.account_type, account.id
                    );
                }
            }
            println!("categories: {}", details.categories.join(", "));
            Ok(())
        }
        Command::CheckToken { token } => {
            if YnabDestination::new(connector)
                .is_access_token_valid(&token)
                .await
            {
                println!("token is valid");
                Ok(())
            } else {
                Err(AppError::InvalidToken)
            }
        }
    }
}

async fn export(
    settings: &Settings,
    connector: Arc<HttpConnector>,
    start_date: Option<NaiveDate>,
) -> Result<()> {
    let start_date = match start_date {
        Some(day) => day.and_time(NaiveTime::MIN).and_utc(),
        None => import::default_start_date(settings.import.days_back),
    };

    let mut bus = EventBus::new();
    bus.subscribe(Arc::new(TracingListener));

    let transactions = import::load_transactions(&settings.import.path, start_date, &bus).await?;

    let mut exporter = Exporter::builder()
        .destination(YnabDestination::new(connector))
        .destination(SpreadsheetDestination::new())
        .build();

    match exporter
        .create_transactions_in_external_vendors(
            &settings.destinations,
            &transactions,
            start_date,
            &bus,
        )
        .await
    {
        Ok(result) => {
            for (destination, created) in result {
                let count = created.map_or(0, |created| created.created());
                tracing::info!("{destination}: {count} transactions created");
            }
            Ok(())
        }
        Err(err) => {
            bus.emit(Event::GeneralError {
                error: err.to_string(),
            })
            .await;
            Err(err.into())
        }
    }
}
