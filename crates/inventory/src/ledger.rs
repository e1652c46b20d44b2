use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CustomerId, ItemId, Money, ValueObject};

/// One completed purchase (immutable once appended).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub item_id: ItemId,
    pub customer_id: CustomerId,
    pub quantity: i64,
    /// Price per unit when the purchase happened.
    pub unit_price: Money,
    /// `quantity * unit_price`.
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

impl ValueObject for PurchaseRecord {}

/// Append-only log of every purchase across all customers, in commit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseLedger {
    records: Vec<PurchaseRecord>,
}

impl PurchaseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, record: PurchaseRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &PurchaseRecord> + Clone + '_ {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&PurchaseRecord> {
        self.records.last()
    }

    /// Records belonging to one customer, in ledger order.
    pub fn for_customer<'a>(
        &'a self,
        customer_id: &'a CustomerId,
    ) -> impl Iterator<Item = &'a PurchaseRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| &r.customer_id == customer_id)
    }

    /// Total amount recorded for one customer.
    pub fn total_for(&self, customer_id: &CustomerId) -> Money {
        self.for_customer(customer_id).map(|r| r.amount).sum()
    }

    /// Units sold of one item.
    pub fn units_sold(&self, item_id: ItemId) -> i64 {
        self.records
            .iter()
            .filter(|r| r.item_id == item_id)
            .map(|r| r.quantity)
            .sum()
    }
}

impl<'a> IntoIterator for &'a PurchaseLedger {
    type Item = &'a PurchaseRecord;
    type IntoIter = core::slice::Iter<'a, PurchaseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
