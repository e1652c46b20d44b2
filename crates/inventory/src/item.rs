use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, ItemId, Money, text::title_case};

/// A stock-keeping unit.
///
/// Construction does not validate price or quantity; the inventory aggregate
/// checks both before an item can take part in a purchase. The mutators are
/// crate-private so stock can only move through [`crate::Inventory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    name: String,
    brand: String,
    price: Money,
    quantity: i64,
    updated_on: NaiveDate,
}

impl Item {
    /// Create an item; `name` and `brand` are title-cased.
    pub fn new(
        id: ItemId,
        name: impl AsRef<str>,
        brand: impl AsRef<str>,
        price: Money,
        quantity: i64,
    ) -> Self {
        Self {
            id,
            name: title_case(name.as_ref()),
            brand: title_case(brand.as_ref()),
            price,
            quantity,
            updated_on: Utc::now().date_naive(),
        }
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Date of creation or of the last price change.
    pub fn updated_on(&self) -> NaiveDate {
        self.updated_on
    }

    /// Whether quantity on hand is at or below `threshold`.
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity <= threshold
    }

    pub(crate) fn update_price(&mut self, new_price: Money, on: NaiveDate) {
        self.price = new_price;
        self.updated_on = on;
    }

    /// Unconditional decrement; callers check sufficiency first.
    pub(crate) fn purchase(&mut self, count: i64) {
        self.quantity -= count;
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
