//! Per-run memory of the transactions a destination already holds.

use std::{collections::HashMap, future::Future, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{RemoteTransaction, ResultExport};

/// Transactions fetched from one destination, keyed by the exact start date
/// used for the fetch.
///
/// Two start dates on the same calendar day are different keys: callers must
/// pass the same value to get a hit.
#[derive(Debug, Default)]
pub struct RemoteStateCache {
    by_start_date: HashMap<DateTime<Utc>, Arc<[RemoteTransaction]>>,
}

impl RemoteStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the transactions cached for `start_date`, calling `fetch` once
    /// on a miss. A failed fetch leaves the cache untouched.
    pub async fn get_or_fetch<F, Fut>(
        &mut self,
        start_date: DateTime<Utc>,
        fetch: F,
    ) -> ResultExport<Arc<[RemoteTransaction]>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResultExport<Vec<RemoteTransaction>>>,
    {
        if let Some(cached) = self.by_start_date.get(&start_date) {
            tracing::debug!("remote transactions cache hit for {start_date}");
            return Ok(Arc::clone(cached));
        }

        tracing::debug!("remote transactions cache miss for {start_date}");
        let fetched: Arc<[RemoteTransaction]> = fetch().await?.into();
        self.by_start_date.insert(start_date, Arc::clone(&fetched));
        Ok(fetched)
    }

    pub fn len(&self) -> usize {
        self.by_start_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_start_date.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_start_date.clear();
    }
}
