use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    Aggregate, AggregateRoot, CustomerId, DomainError, DomainResult, IdAllocator, ItemId, Money,
    text::title_case,
};
use stockroom_events::Event;

use crate::customer::{Customer, line_total};
use crate::item::Item;
use crate::ledger::{PurchaseLedger, PurchaseRecord};
use crate::report::{StockLine, StockReport, TopCustomer};

/// Quantity at or below which an item counts as low on stock.
pub const LOW_STOCK_THRESHOLD: i64 = 3;

/// Aggregate root: Inventory.
///
/// Exclusively owns every item, every customer and the purchase ledger. All
/// mutation goes through [`Aggregate::handle`] (validation) followed by
/// [`Aggregate::apply`] (infallible state change), so a rejected command never
/// leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    items: BTreeMap<ItemId, Item>,
    /// Creation order is kept for snapshots.
    customers: Vec<Customer>,
    customer_index: HashMap<CustomerId, usize>,
    email_index: HashMap<String, usize>,
    ledger: PurchaseLedger,
    item_ids: IdAllocator,
    low_stock_threshold: i64,
    version: u64,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::with_low_stock_threshold(LOW_STOCK_THRESHOLD)
    }

    pub fn with_low_stock_threshold(threshold: i64) -> Self {
        Self {
            items: BTreeMap::new(),
            customers: Vec::new(),
            customer_index: HashMap::new(),
            email_index: HashMap::new(),
            ledger: PurchaseLedger::new(),
            item_ids: IdAllocator::new(),
            low_stock_threshold: threshold,
            version: 0,
        }
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    /// Items ordered by id.
    pub fn items(&self) -> impl ExactSizeIterator<Item = &Item> + Clone + '_ {
        self.items.values()
    }

    /// Customers in creation order.
    pub fn customers(&self) -> impl ExactSizeIterator<Item = &Customer> + Clone + '_ {
        self.customers.iter()
    }

    pub fn ledger(&self) -> &PurchaseLedger {
        &self.ledger
    }

    /// Silent lookup (no low-stock signal).
    pub fn item(&self, item_id: ItemId) -> Option<&Item> {
        self.items.get(&item_id)
    }

    pub fn customer(&self, customer_id: &CustomerId) -> Option<&Customer> {
        self.customer_index
            .get(customer_id)
            .and_then(|idx| self.customers.get(*idx))
    }

    pub fn customer_by_email(&self, email: &str) -> Option<&Customer> {
        self.email_index
            .get(email)
            .and_then(|idx| self.customers.get(*idx))
    }

    /// Decide + apply one command.
    pub fn execute(&mut self, command: &InventoryCommand) -> DomainResult<Vec<InventoryEvent>> {
        let events = stockroom_events::execute(self, command)?;
        for ev in &events {
            tracing::debug!(event_type = ev.event_type(), version = self.version, "inventory event applied");
        }
        Ok(events)
    }

    /// Insert an item, replacing any item with the same id.
    pub fn add_item(&mut self, item: Item) -> DomainResult<ItemId> {
        let item_id = item.id_typed();
        self.execute(&InventoryCommand::AddItem(AddItem {
            item,
            occurred_at: Utc::now(),
        }))?;
        Ok(item_id)
    }

    /// Create an item with the next free id.
    pub fn create_item(
        &mut self,
        name: &str,
        brand: &str,
        price: Money,
        quantity: i64,
    ) -> DomainResult<ItemId> {
        let events = self.execute(&InventoryCommand::CreateItem(CreateItem {
            name: name.to_string(),
            brand: brand.to_string(),
            price,
            quantity,
            occurred_at: Utc::now(),
        }))?;
        match events.first() {
            Some(InventoryEvent::ItemAdded(added)) => Ok(added.item.id_typed()),
            _ => Err(DomainError::conflict("item creation produced no item")),
        }
    }

    pub fn update_price(&mut self, item_id: ItemId, new_price: Money) -> DomainResult<()> {
        self.execute(&InventoryCommand::UpdatePrice(UpdatePrice {
            item_id,
            new_price,
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    /// Look up an item, warning through `tracing` when it is low on stock.
    pub fn get_item(&self, item_id: ItemId) -> DomainResult<&Item> {
        let item = self
            .items
            .get(&item_id)
            .ok_or_else(|| DomainError::not_found(format!("item {item_id}")))?;
        if item.is_low_stock(self.low_stock_threshold) {
            tracing::warn!(
                item_id = %item_id,
                name = item.name(),
                quantity = item.quantity(),
                "low stock"
            );
        }
        Ok(item)
    }

    /// Return the id of the customer owning `email`, registering one if needed.
    pub fn resolve_or_create_customer(&mut self, name: &str, email: &str) -> DomainResult<CustomerId> {
        if let Some(existing) = self.customer_by_email(email) {
            return Ok(existing.id_typed().clone());
        }
        self.execute(&InventoryCommand::RegisterCustomer(RegisterCustomer {
            name: name.to_string(),
            email: email.to_string(),
            occurred_at: Utc::now(),
        }))?;
        Ok(CustomerId::from_email(email))
    }

    /// Sell `quantity` units of an item to the customer identified by `email`.
    pub fn purchase_item(
        &mut self,
        item_id: ItemId,
        quantity: i64,
        customer_name: &str,
        customer_email: &str,
    ) -> DomainResult<PurchaseReceipt> {
        self.purchase(&PurchaseItem {
            item_id,
            quantity,
            customer_name: customer_name.to_string(),
            customer_email: customer_email.to_string(),
            occurred_at: Utc::now(),
        })
    }

    /// Same as [`purchase_item`](Self::purchase_item) with an explicit timestamp.
    pub fn purchase(&mut self, cmd: &PurchaseItem) -> DomainResult<PurchaseReceipt> {
        // Goes through `get_item` so a low item warns before the sale; a
        // missing item is rejected by `handle`.
        let low_stock_before = self
            .get_item(cmd.item_id)
            .is_ok_and(|item| item.is_low_stock(self.low_stock_threshold));
        let events = self.execute(&InventoryCommand::PurchaseItem(cmd.clone()))?;

        let new_customer = events
            .iter()
            .any(|ev| matches!(ev, InventoryEvent::CustomerRegistered(_)));
        let Some(InventoryEvent::ItemPurchased(purchased)) = events.into_iter().last() else {
            return Err(DomainError::conflict("purchase produced no ledger entry"));
        };
        let low_stock = self
            .items
            .get(&cmd.item_id)
            .is_some_and(|item| item.is_low_stock(self.low_stock_threshold));

        Ok(PurchaseReceipt {
            record: purchased.record,
            new_customer,
            low_stock_before,
            low_stock,
        })
    }

    /// One line per item, flagging those at or below the low-stock threshold.
    pub fn generate_low_stock_report(&self) -> StockReport {
        let lines = self
            .items
            .values()
            .map(|item| StockLine {
                item_id: item.id_typed(),
                name: item.name().to_string(),
                quantity: item.quantity(),
                low_stock: item.is_low_stock(self.low_stock_threshold),
            })
            .collect();
        StockReport::new(lines)
    }

    /// Customers whose in-memory total strictly exceeds `threshold`.
    pub fn top_customers(&self, threshold: Money) -> Vec<TopCustomer> {
        self.customers
            .iter()
            .filter(|c| c.total_spent() > threshold)
            .map(|c| TopCustomer {
                customer_id: c.id_typed().clone(),
                total_spent: c.total_spent(),
            })
            .collect()
    }

    fn ensure_item_values(name: &str, price: Money, quantity: i64) -> DomainResult<()> {
        if name.trim().is_empty() {
            return Err(DomainError::invalid_argument("name cannot be empty"));
        }
        if !price.is_positive() {
            return Err(DomainError::invalid_argument(format!(
                "price must be positive (got {price})"
            )));
        }
        if quantity < 0 {
            return Err(DomainError::invalid_argument(format!(
                "quantity cannot be negative (got {quantity})"
            )));
        }
        Ok(())
    }

    fn handle_add(&self, cmd: &AddItem) -> DomainResult<Vec<InventoryEvent>> {
        let item = &cmd.item;
        if !self.item_ids.accepts(item.id_typed()) {
            return Err(DomainError::invalid_argument(format!(
                "item id {} is reserved",
                item.id_typed()
            )));
        }
        Self::ensure_item_values(item.name(), item.price(), item.quantity())?;
        Ok(vec![InventoryEvent::ItemAdded(ItemAdded {
            item: item.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_create(&self, cmd: &CreateItem) -> DomainResult<Vec<InventoryEvent>> {
        Self::ensure_item_values(&cmd.name, cmd.price, cmd.quantity)?;
        let item_id = self
            .item_ids
            .peek()
            .ok_or_else(|| DomainError::invalid_argument("no item ids left"))?;
        let item = Item::new(
            item_id,
            &cmd.name,
            &cmd.brand,
            cmd.price,
            cmd.quantity,
        );
        Ok(vec![InventoryEvent::ItemAdded(ItemAdded {
            item,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_price(&self, cmd: &UpdatePrice) -> DomainResult<Vec<InventoryEvent>> {
        let item = self
            .items
            .get(&cmd.item_id)
            .ok_or_else(|| DomainError::not_found(format!("item {}", cmd.item_id)))?;
        if !cmd.new_price.is_positive() {
            return Err(DomainError::invalid_argument(format!(
                "price must be positive (got {})",
                cmd.new_price
            )));
        }
        Ok(vec![InventoryEvent::PriceUpdated(PriceUpdated {
            item_id: cmd.item_id,
            old_price: item.price(),
            new_price: cmd.new_price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_register(
        &self,
        name: &str,
        email: &str,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Vec<InventoryEvent>> {
        if self.email_index.contains_key(email) {
            return Ok(vec![]);
        }
        if email.trim().is_empty() {
            return Err(DomainError::invalid_argument("email cannot be empty"));
        }
        let customer_id = CustomerId::from_email(email);
        if self.customer_index.contains_key(&customer_id) {
            return Err(DomainError::conflict(format!(
                "customer id {customer_id} already belongs to another email"
            )));
        }
        Ok(vec![InventoryEvent::CustomerRegistered(CustomerRegistered {
            customer_id,
            name: title_case(name),
            email: email.to_string(),
            occurred_at,
        })])
    }

    fn handle_purchase(&self, cmd: &PurchaseItem) -> DomainResult<Vec<InventoryEvent>> {
        let item = self
            .items
            .get(&cmd.item_id)
            .ok_or_else(|| DomainError::not_found(format!("item {}", cmd.item_id)))?;

        if cmd.quantity <= 0 {
            return Err(DomainError::invalid_argument(format!(
                "quantity must be positive (got {})",
                cmd.quantity
            )));
        }
        if item.quantity() < cmd.quantity {
            return Err(DomainError::insufficient_stock(
                cmd.item_id.get(),
                cmd.quantity,
                item.quantity(),
            ));
        }
        let amount = line_total(cmd.quantity, item.price())?;

        let mut events = Vec::with_capacity(2);
        let customer_id = match self.customer_by_email(&cmd.customer_email) {
            Some(customer) => {
                customer.ensure_can_spend(amount)?;
                customer.id_typed().clone()
            }
            None => {
                events.extend(self.handle_register(
                    &cmd.customer_name,
                    &cmd.customer_email,
                    cmd.occurred_at,
                )?);
                CustomerId::from_email(&cmd.customer_email)
            }
        };

        events.push(InventoryEvent::ItemPurchased(ItemPurchased {
            record: PurchaseRecord {
                item_id: cmd.item_id,
                customer_id,
                quantity: cmd.quantity,
                unit_price: item.price(),
                amount,
                occurred_at: cmd.occurred_at,
            },
        }));
        Ok(events)
    }
}

impl AggregateRoot for Inventory {
    fn version(&self) -> u64 {
        self.version
    }
}

/// Outcome of a committed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub record: PurchaseRecord,
    /// Whether this purchase registered the customer.
    pub new_customer: bool,
    /// Whether the item was already at or below the low-stock threshold.
    pub low_stock_before: bool,
    /// Whether the item is at or below the low-stock threshold afterwards.
    pub low_stock: bool,
}

impl PurchaseReceipt {
    pub fn customer_id(&self) -> &CustomerId {
        &self.record.customer_id
    }
}

/// Command: AddItem (insert a pre-built item).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItem {
    pub item: Item,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CreateItem (allocate an id and insert).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItem {
    pub name: String,
    pub brand: String,
    pub price: Money,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdatePrice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePrice {
    pub item_id: ItemId,
    pub new_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RegisterCustomer (no-op when the email is already known).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCustomer {
    pub name: String,
    pub email: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PurchaseItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub item_id: ItemId,
    pub quantity: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    AddItem(AddItem),
    CreateItem(CreateItem),
    UpdatePrice(UpdatePrice),
    RegisterCustomer(RegisterCustomer),
    PurchaseItem(PurchaseItem),
}

/// Event: ItemAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub item: Item,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PriceUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdated {
    pub item_id: ItemId,
    pub old_price: Money,
    pub new_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRegistered {
    pub customer_id: CustomerId,
    pub name: String,
    pub email: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemPurchased.
///
/// Carries the full ledger record; applying it debits stock, credits the
/// customer history and appends to the ledger in one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPurchased {
    pub record: PurchaseRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemAdded(ItemAdded),
    PriceUpdated(PriceUpdated),
    CustomerRegistered(CustomerRegistered),
    ItemPurchased(ItemPurchased),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemAdded(_) => "inventory.item.added",
            InventoryEvent::PriceUpdated(_) => "inventory.item.price_updated",
            InventoryEvent::CustomerRegistered(_) => "inventory.customer.registered",
            InventoryEvent::ItemPurchased(_) => "inventory.item.purchased",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemAdded(e) => e.occurred_at,
            InventoryEvent::PriceUpdated(e) => e.occurred_at,
            InventoryEvent::CustomerRegistered(e) => e.occurred_at,
            InventoryEvent::ItemPurchased(e) => e.record.occurred_at,
        }
    }
}

impl Aggregate for Inventory {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemAdded(e) => {
                let item_id = e.item.id_typed();
                self.item_ids.observe(item_id);
                self.items.insert(item_id, e.item.clone());
            }
            InventoryEvent::PriceUpdated(e) => {
                if let Some(item) = self.items.get_mut(&e.item_id) {
                    item.update_price(e.new_price, e.occurred_at.date_naive());
                }
            }
            InventoryEvent::CustomerRegistered(e) => {
                let idx = self.customers.len();
                let customer = Customer::new(&e.name, e.email.clone());
                self.customer_index.insert(e.customer_id.clone(), idx);
                self.email_index.insert(e.email.clone(), idx);
                self.customers.push(customer);
            }
            InventoryEvent::ItemPurchased(e) => {
                let r = &e.record;
                if let Some(customer) = self
                    .customer_index
                    .get(&r.customer_id)
                    .copied()
                    .and_then(|idx| self.customers.get_mut(idx))
                {
                    customer.record(r.item_id, r.quantity, r.amount, r.occurred_at);
                }
                if let Some(item) = self.items.get_mut(&r.item_id) {
                    item.purchase(r.quantity);
                }
                self.ledger.append(r.clone());
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::AddItem(cmd) => self.handle_add(cmd),
            InventoryCommand::CreateItem(cmd) => self.handle_create(cmd),
            InventoryCommand::UpdatePrice(cmd) => self.handle_update_price(cmd),
            InventoryCommand::RegisterCustomer(cmd) => {
                self.handle_register(&cmd.name, &cmd.email, cmd.occurred_at)
            }
            InventoryCommand::PurchaseItem(cmd) => self.handle_purchase(cmd),
        }
    }
}
