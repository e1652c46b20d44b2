//! Persistence collaborators for the inventory aggregate.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use stockroom_inventory::{Inventory, SnapshotRow, StockReport};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::files;

/// Receives committed inventory state and serves the persisted customer rows.
///
/// Implementations must only read from the inventory they are handed.
pub trait SnapshotStore: Send + Sync {
    /// Persist the purchase ledger and the customer snapshot.
    fn persist(&self, inventory: &Inventory) -> Result<(), StoreError>;

    /// Persist a rendered stock report.
    fn write_report(&self, report: &StockReport, generated_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Read back the persisted customer rows.
    fn load_customer_rows(&self) -> Result<Vec<SnapshotRow>, StoreError>;
}

impl<S> SnapshotStore for Arc<S>
where
    S: SnapshotStore + ?Sized,
{
    fn persist(&self, inventory: &Inventory) -> Result<(), StoreError> {
        (**self).persist(inventory)
    }

    fn write_report(&self, report: &StockReport, generated_at: DateTime<Utc>) -> Result<(), StoreError> {
        (**self).write_report(report, generated_at)
    }

    fn load_customer_rows(&self) -> Result<Vec<SnapshotRow>, StoreError> {
        (**self).load_customer_rows()
    }
}

/// CSV + text files under a data directory.
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    config: StoreConfig,
}

impl FlatFileStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

impl SnapshotStore for FlatFileStore {
    fn persist(&self, inventory: &Inventory) -> Result<(), StoreError> {
        files::write_purchase_ledger(&self.config.ledger_path(), inventory.ledger())?;
        files::write_customer_snapshot(&self.config.customer_path(), inventory.customers())?;
        Ok(())
    }

    fn write_report(&self, report: &StockReport, generated_at: DateTime<Utc>) -> Result<(), StoreError> {
        files::write_inventory_report(&self.config.report_path(), report, generated_at)
    }

    fn load_customer_rows(&self) -> Result<Vec<SnapshotRow>, StoreError> {
        files::read_customer_snapshot(&self.config.customer_path())
    }
}

/// In-memory store for tests/dev.
///
/// Keeps the latest customer rows and report and counts persist calls.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<SnapshotRow>,
    ledger_len: usize,
    report: Option<String>,
    persists: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persist_count(&self) -> usize {
        self.inner.read().map(|s| s.persists).unwrap_or(0)
    }

    /// Ledger length at the last persist.
    pub fn ledger_len(&self) -> usize {
        self.inner.read().map(|s| s.ledger_len).unwrap_or(0)
    }

    pub fn last_report(&self) -> Option<String> {
        self.inner.read().ok().and_then(|s| s.report.clone())
    }

    fn poisoned() -> StoreError {
        StoreError::Io(std::io::Error::other("memory store lock poisoned"))
    }
}

impl SnapshotStore for MemoryStore {
    fn persist(&self, inventory: &Inventory) -> Result<(), StoreError> {
        let rows = inventory
            .customers()
            .enumerate()
            .map(|(idx, c)| SnapshotRow {
                line: idx as u64 + 2,
                customer_id: c.id_typed().to_string(),
                total_spent: c.total_spent().to_string(),
            })
            .collect();
        let mut state = self.inner.write().map_err(|_| Self::poisoned())?;
        state.rows = rows;
        state.ledger_len = inventory.ledger().len();
        state.persists += 1;
        Ok(())
    }

    fn write_report(&self, report: &StockReport, generated_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.inner.write().map_err(|_| Self::poisoned())?;
        state.report = Some(format!(
            "Inventory Report\nGenerated on: {}\n\n{report}",
            generated_at.format(files::TIMESTAMP_FORMAT)
        ));
        Ok(())
    }

    fn load_customer_rows(&self) -> Result<Vec<SnapshotRow>, StoreError> {
        let state = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(state.rows.clone())
    }
}
