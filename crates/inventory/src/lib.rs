//! Inventory domain module.
//!
//! Items, customers and the purchase ledger, orchestrated by the `Inventory`
//! aggregate. Pure domain logic: no file or network IO.

pub mod customer;
pub mod inventory;
pub mod item;
pub mod ledger;
pub mod report;

pub use customer::{Customer, PurchaseEntry};
pub use inventory::{
    AddItem, CreateItem, CustomerRegistered, Inventory, InventoryCommand, InventoryEvent,
    ItemAdded, ItemPurchased, LOW_STOCK_THRESHOLD, PriceUpdated, PurchaseItem, PurchaseReceipt,
    RegisterCustomer, UpdatePrice,
};
pub use item::Item;
pub use ledger::{PurchaseLedger, PurchaseRecord};
pub use report::{
    SnapshotRow, StockLine, StockReport, TOP_SPENDER_THRESHOLD, TopCustomer, TopCustomerScan,
    identify_top_customers,
};
