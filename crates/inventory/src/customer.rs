use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    CustomerId, DomainError, DomainResult, Entity, ItemId, Money, ValueObject, text::title_case,
};

/// One line of a customer's purchase history (immutable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseEntry {
    pub item_id: ItemId,
    pub quantity: i64,
    pub date: NaiveDate,
    /// `unit_price * quantity` at the time of purchase.
    pub line_total: Money,
}

impl ValueObject for PurchaseEntry {}

/// A customer: identity plus an append-only purchase history.
///
/// `total_spent` always equals the sum of `line_total` over the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    email: String,
    history: Vec<PurchaseEntry>,
    total_spent: Money,
}

impl Customer {
    /// Create a customer with an empty history; the name is title-cased and
    /// the id is derived from the email.
    pub fn new(name: impl AsRef<str>, email: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            id: CustomerId::from_email(&email),
            name: title_case(name.as_ref()),
            email,
            history: Vec::new(),
            total_spent: Money::ZERO,
        }
    }

    pub fn id_typed(&self) -> &CustomerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn total_spent(&self) -> Money {
        self.total_spent
    }

    /// Number of purchases made (not the sum of quantities).
    pub fn purchase_count(&self) -> usize {
        self.history.len()
    }

    /// Purchase history in chronological order.
    ///
    /// The iterator is `Clone`, so a snapshot can be walked more than once.
    pub fn purchase_history(&self) -> impl ExactSizeIterator<Item = &PurchaseEntry> + Clone + '_ {
        self.history.iter()
    }

    /// Record a purchase of `quantity` units at `unit_price`.
    ///
    /// Rejects non-positive quantities and prices before touching the history.
    pub fn add_purchase(
        &mut self,
        item_id: ItemId,
        quantity: i64,
        unit_price: Money,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<&PurchaseEntry> {
        let line_total = line_total(quantity, unit_price)?;
        self.ensure_can_spend(line_total)?;
        Ok(self.record(item_id, quantity, line_total, occurred_at))
    }

    pub(crate) fn ensure_can_spend(&self, amount: Money) -> DomainResult<()> {
        self.total_spent
            .checked_add(amount)
            .map(|_| ())
            .ok_or_else(|| DomainError::invalid_argument("total spent overflows"))
    }

    /// Append an already validated entry.
    pub(crate) fn record(
        &mut self,
        item_id: ItemId,
        quantity: i64,
        line_total: Money,
        occurred_at: DateTime<Utc>,
    ) -> &PurchaseEntry {
        self.total_spent += line_total;
        self.history.push(PurchaseEntry {
            item_id,
            quantity,
            date: occurred_at.date_naive(),
            line_total,
        });
        // Just pushed, so the history is non-empty.
        &self.history[self.history.len() - 1]
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Validate a purchase line and compute its total.
pub(crate) fn line_total(quantity: i64, unit_price: Money) -> DomainResult<Money> {
    if quantity <= 0 {
        return Err(DomainError::invalid_argument(format!(
            "quantity must be positive (got {quantity})"
        )));
    }
    if !unit_price.is_positive() {
        return Err(DomainError::invalid_argument(format!(
            "price must be positive (got {unit_price})"
        )));
    }
    unit_price
        .checked_mul(quantity)
        .ok_or_else(|| DomainError::invalid_argument("purchase amount overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn john() -> Customer {
        Customer::new("john doe", "johndoe@example.com")
    }

    #[test]
    fn new_customer_normalizes_name_and_starts_empty() {
        let c = john();
        assert_eq!(c.name(), "John Doe");
        assert_eq!(c.email(), "johndoe@example.com");
        assert!(c.id_typed().as_str().starts_with("johndoe_"));
        assert_eq!(c.total_spent(), Money::ZERO);
        assert_eq!(c.purchase_count(), 0);
    }

    #[test]
    fn add_purchase_updates_history_and_total() {
        let mut c = john();
        let entry = c
            .add_purchase(ItemId::new(1), 2, Money::from_units(100), Utc::now())
            .unwrap()
            .clone();
        assert_eq!(entry.line_total, Money::from_units(200));
        assert_eq!(c.total_spent(), Money::from_units(200));
        assert_eq!(c.purchase_count(), 1);
    }

    #[test]
    fn add_purchase_rejects_non_positive_inputs() {
        let mut c = john();
        for (qty, price) in [(0, 100), (-1, 100), (1, 0), (1, -5)] {
            let err = c
                .add_purchase(ItemId::new(1), qty, Money::from_units(price), Utc::now())
                .unwrap_err();
            match err {
                DomainError::InvalidArgument(_) => {}
                other => panic!("Expected InvalidArgument, got {other:?}"),
            }
        }
        assert_eq!(c.purchase_count(), 0);
        assert_eq!(c.total_spent(), Money::ZERO);
    }

    #[test]
    fn purchase_history_is_restartable_and_ordered() {
        let mut c = john();
        for id in 0..3 {
            c.add_purchase(ItemId::new(id), 1, Money::from_units(10), Utc::now())
                .unwrap();
        }
        let snapshot = c.purchase_history();
        let first: Vec<_> = snapshot.clone().map(|e| e.item_id).collect();
        let second: Vec<_> = snapshot.map(|e| e.item_id).collect();
        assert_eq!(first, vec![ItemId::new(0), ItemId::new(1), ItemId::new(2)]);
        assert_eq!(first, second);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: total_spent equals the sum of line totals and the history
        /// length equals the number of accepted purchases.
        #[test]
        fn total_spent_reconciles_with_history(
            lines in prop::collection::vec((-3i64..50i64, -100i64..10_000i64), 0..30)
        ) {
            let mut c = john();
            let mut accepted = 0usize;
            for (qty, cents) in lines {
                if c.add_purchase(ItemId::new(7), qty, Money::from_cents(cents), Utc::now()).is_ok() {
                    accepted += 1;
                }
            }
            let sum: Money = c.purchase_history().map(|e| e.line_total).sum();
            prop_assert_eq!(c.total_spent(), sum);
            prop_assert_eq!(c.purchase_count(), accepted);
        }
    }
}
