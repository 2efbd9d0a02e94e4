//! Reconciliation of scraped bank transactions with budgeting destinations.
//!
//! An export run takes every transaction the import stage produced, and for
//! each active [`Destination`] creates only the ones the destination does not
//! hold yet. Matching is tolerant (see [`dedup`]) because destinations assign
//! their own ids.

pub use cache::RemoteStateCache;
pub use config::{DestinationsConfig, INITIAL_YNAB_ACCESS_TOKEN, SpreadsheetConfig, YnabConfig};
pub use destinations::{
    AccountDetails, Destination, DestinationName, SpreadsheetDestination, YnabDestination,
    YnabFinancialAccount,
};
pub use error::{ExportError, PartialExport, RemoteError};
pub use events::{AccountStatus, Event, EventBus, EventListener, EventPublisher};
pub use export::{ExecutionResult, Exporter, ExporterBuilder};
pub use normalize::{Category, CategoryGroup, CategoryIndex};
pub use remote::{Account, BudgetApi, BudgetApiConnector, BudgetSummary};
pub use transactions::{
    CreationResult, EnrichedTransaction, NormalizedTransaction, RemoteTransaction, SourceId,
};

pub mod dedup;
pub mod destinations;
pub mod events;
pub mod normalize;

mod cache;
mod config;
mod error;
mod export;
mod remote;
mod transactions;

pub type ResultExport<T> = Result<T, ExportError>;
