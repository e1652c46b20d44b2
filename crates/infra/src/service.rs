//! Application-level orchestration around the inventory aggregate.
//!
//! `InventoryService` serializes every operation through one mutex. A purchase
//! runs lookup, stock check, customer resolution, stock debit, ledger append
//! and persistence inside that single critical section, so two concurrent
//! purchases can never both pass the stock check against the same units.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use stockroom_core::{CustomerId, ItemId, Money};
use stockroom_inventory::{
    Customer, Inventory, Item, PurchaseReceipt, PurchaseRecord, StockReport, TopCustomer,
    TopCustomerScan, identify_top_customers,
};

use crate::config::StoreConfig;
use crate::error::ServiceError;
use crate::store::{FlatFileStore, SnapshotStore};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub struct InventoryService<S> {
    state: Mutex<Inventory>,
    store: S,
    top_spender_threshold: Money,
}

impl InventoryService<FlatFileStore> {
    /// Empty inventory persisting to the files named in `config`.
    pub fn from_config(config: StoreConfig) -> Self {
        let inventory = Inventory::with_low_stock_threshold(config.low_stock_threshold);
        let threshold = config.top_spender_threshold;
        Self::new(inventory, FlatFileStore::new(config)).with_top_spender_threshold(threshold)
    }
}

impl<S> InventoryService<S>
where
    S: SnapshotStore,
{
    pub fn new(inventory: Inventory, store: S) -> Self {
        Self {
            state: Mutex::new(inventory),
            store,
            top_spender_threshold: stockroom_inventory::TOP_SPENDER_THRESHOLD,
        }
    }

    pub fn with_top_spender_threshold(mut self, threshold: Money) -> Self {
        self.top_spender_threshold = threshold;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock(&self) -> ServiceResult<MutexGuard<'_, Inventory>> {
        self.state.lock().map_err(|_| ServiceError::LockPoisoned)
    }

    /// Run a read-only closure against the current state.
    pub fn read<T>(&self, f: impl FnOnce(&Inventory) -> T) -> ServiceResult<T> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    pub fn add_item(&self, item: Item) -> ServiceResult<ItemId> {
        let mut inv = self.lock()?;
        let id = inv.add_item(item).inspect_err(|e| {
            tracing::warn!(error = %e, "add item rejected");
        })?;
        tracing::info!(item_id = %id, "item added");
        Ok(id)
    }

    pub fn create_item(
        &self,
        name: &str,
        brand: &str,
        price: Money,
        quantity: i64,
    ) -> ServiceResult<ItemId> {
        let mut inv = self.lock()?;
        let id = inv
            .create_item(name, brand, price, quantity)
            .inspect_err(|e| tracing::warn!(error = %e, name, "create item rejected"))?;
        tracing::info!(item_id = %id, name, "item created");
        Ok(id)
    }

    pub fn update_price(&self, item_id: ItemId, new_price: Money) -> ServiceResult<()> {
        let mut inv = self.lock()?;
        inv.update_price(item_id, new_price)
            .inspect_err(|e| tracing::warn!(item_id = %item_id, error = %e, "price update rejected"))?;
        tracing::info!(item_id = %item_id, price = %new_price, "price updated");
        Ok(())
    }

    /// Copy of one item; logs a warning when it is low on stock.
    pub fn get_item(&self, item_id: ItemId) -> ServiceResult<Item> {
        let inv = self.lock()?;
        let item = inv
            .get_item(item_id)
            .inspect_err(|e| tracing::warn!(item_id = %item_id, error = %e, "item lookup failed"))?;
        Ok(item.clone())
    }

    pub fn customer(&self, customer_id: &CustomerId) -> ServiceResult<Option<Customer>> {
        self.read(|inv| inv.customer(customer_id).cloned())
    }

    pub fn resolve_or_create_customer(&self, name: &str, email: &str) -> ServiceResult<CustomerId> {
        let mut inv = self.lock()?;
        Ok(inv.resolve_or_create_customer(name, email)?)
    }

    /// Validate, commit and persist one purchase.
    ///
    /// Domain rejections leave state and files untouched. A store failure is
    /// reported after the in-memory commit.
    pub fn purchase_item(
        &self,
        item_id: ItemId,
        quantity: i64,
        customer_name: &str,
        customer_email: &str,
    ) -> ServiceResult<PurchaseReceipt> {
        let mut inv = self.lock()?;

        let receipt = inv
            .purchase_item(item_id, quantity, customer_name, customer_email)
            .inspect_err(|e| {
                tracing::warn!(item_id = %item_id, quantity, error = %e, "purchase rejected");
            })?;

        tracing::info!(
            item_id = %item_id,
            customer_id = %receipt.customer_id(),
            quantity,
            amount = %receipt.record.amount,
            "purchase committed"
        );
        if receipt.low_stock {
            tracing::warn!(item_id = %item_id, "item is low on stock after purchase");
        }

        self.store.persist(&inv).inspect_err(|e| {
            tracing::error!(error = %e, "failed to persist state after purchase");
        })?;
        Ok(receipt)
    }

    pub fn ledger(&self) -> ServiceResult<Vec<PurchaseRecord>> {
        self.read(|inv| inv.ledger().iter().cloned().collect())
    }

    /// Build the stock report and hand it to the store.
    pub fn generate_report(&self) -> ServiceResult<StockReport> {
        let report = self.read(Inventory::generate_low_stock_report)?;
        self.store.write_report(&report, Utc::now())?;
        Ok(report)
    }

    /// Top spenders according to the persisted customer snapshot.
    pub fn identify_top_customers(&self) -> ServiceResult<TopCustomerScan> {
        let rows = self.store.load_customer_rows()?;
        let scan = identify_top_customers(rows, self.top_spender_threshold);
        for top in &scan.top {
            tracing::info!(customer_id = %top.customer_id, total_spent = %top.total_spent, "top customer");
        }
        Ok(scan)
    }

    /// Top spenders according to in-memory state.
    pub fn top_customers(&self) -> ServiceResult<Vec<TopCustomer>> {
        let threshold = self.top_spender_threshold;
        self.read(|inv| inv.top_customers(threshold))
    }
}
