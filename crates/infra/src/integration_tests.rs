//! Integration tests for the full purchase pipeline.
//!
//! Tests: Service → Inventory aggregate → flat files → top-spender scan
//!
//! Verifies:
//! - Purchases update stock, customers and both CSV exports
//! - Rejected purchases leave memory and disk untouched
//! - The persisted snapshot agrees with in-memory totals
//! - Concurrent purchases cannot overdraw stock

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use proptest::prelude::*;
    use tempfile::TempDir;

    use stockroom_core::{DomainError, ItemId, Money};
    use stockroom_inventory::Inventory;

    use crate::config::StoreConfig;
    use crate::files;
    use crate::service::InventoryService;
    use crate::store::{FlatFileStore, MemoryStore};

    fn setup() -> (TempDir, InventoryService<FlatFileStore>) {
        stockroom_observability::init();
        let dir = tempfile::tempdir().unwrap();
        let service = InventoryService::from_config(StoreConfig::in_dir(dir.path()));
        (dir, service)
    }

    fn csv_rows(path: &std::path::Path) -> Vec<csv::StringRecord> {
        csv::Reader::from_path(path)
            .unwrap()
            .records()
            .map(Result::unwrap)
            .collect()
    }

    #[test]
    fn laptop_scenario_end_to_end() -> anyhow::Result<()> {
        let (_dir, service) = setup();
        let laptop = service.create_item("laptop", "dell", Money::from_units(1500), 10)?;

        let first = service.purchase_item(laptop, 2, "john", "john@x.com")?;
        assert_eq!(service.get_item(laptop)?.quantity(), 8);
        assert!(service.identify_top_customers()?.top.is_empty());

        let second = service.purchase_item(laptop, 3, "John", "john@x.com")?;
        assert_eq!(second.customer_id(), first.customer_id());
        assert_eq!(service.get_item(laptop)?.quantity(), 5);

        let customer = service.customer(first.customer_id())?.unwrap();
        assert_eq!(customer.total_spent(), Money::from_units(7500));
        assert_eq!(service.ledger()?.len(), 2);

        let scan = service.identify_top_customers()?;
        assert_eq!(scan.top.len(), 1);
        assert_eq!(&scan.top[0].customer_id, first.customer_id());
        assert_eq!(scan.top[0].total_spent, Money::from_units(7500));
        Ok(())
    }

    #[test]
    fn csv_exports_track_every_purchase() -> anyhow::Result<()> {
        let (dir, service) = setup();
        let config = StoreConfig::in_dir(dir.path());
        let keyboard = service.create_item("keyboard", "brandk", Money::from_units(100), 10)?;

        service.purchase_item(keyboard, 2, "Charlie Brown", "charlie@example.com")?;
        service.purchase_item(keyboard, 3, "Charlie Brown", "charlie@example.com")?;

        let customers = csv_rows(&config.customer_path());
        assert_eq!(customers.len(), 1);
        assert_eq!(&customers[0][1], "Charlie Brown");
        assert_eq!(&customers[0][3], "2");
        assert_eq!(&customers[0][4], "500.00");

        let purchases = csv_rows(&config.ledger_path());
        assert_eq!(purchases.len(), 2);
        assert_eq!(&purchases[0][1], &customers[0][0]);
        Ok(())
    }

    #[test]
    fn rejected_purchase_leaves_files_untouched() -> anyhow::Result<()> {
        let (dir, service) = setup();
        let config = StoreConfig::in_dir(dir.path());
        let mouse = service.create_item("mouse", "logi", Money::from_units(50), 2)?;

        service.purchase_item(mouse, 1, "amy", "amy@x.com")?;
        let snapshot_before = std::fs::read_to_string(config.customer_path())?;

        let err = service.purchase_item(mouse, 5, "bo", "bo@x.com").unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(DomainError::InsufficientStock { .. })
        ));
        let err = service.purchase_item(ItemId::new(99), 1, "bo", "bo@x.com").unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));

        assert_eq!(std::fs::read_to_string(config.customer_path())?, snapshot_before);
        assert_eq!(service.get_item(mouse)?.quantity(), 1);
        assert!(service.read(|inv| inv.customer_by_email("bo@x.com").is_none())?);
        Ok(())
    }

    #[test]
    fn two_customers_above_threshold_are_both_reported() -> anyhow::Result<()> {
        let (_dir, service) = setup();
        let desktop = service.create_item("desktop", "brandd", Money::from_units(1500), 10)?;

        service.purchase_item(desktop, 4, "John Doe", "john@example.com")?;
        service.purchase_item(desktop, 4, "Jane Doe", "jane@example.com")?;

        let scan = service.identify_top_customers()?;
        assert_eq!(scan.top.len(), 2);
        assert!(scan.skipped.is_empty());
        Ok(())
    }

    #[test]
    fn report_file_is_written_on_demand() -> anyhow::Result<()> {
        let (dir, service) = setup();
        service.create_item("laptop", "brandx", Money::from_units(1500), 10)?;
        service.create_item("mouse", "brandy", Money::from_units(50), 3)?;
        service.create_item("keyboard", "brandz", Money::from_units(100), 2)?;

        service.generate_report()?;

        let text = std::fs::read_to_string(StoreConfig::in_dir(dir.path()).report_path())?;
        assert!(text.contains("Item Name: Laptop, Quantity: 10"));
        assert!(text.contains("WARNING: Low Mouse stock! Quantity: 3"));
        assert!(text.contains("WARNING: Low Keyboard stock! Quantity: 2"));
        Ok(())
    }

    #[test]
    fn malformed_snapshot_rows_are_skipped() -> anyhow::Result<()> {
        let (dir, service) = setup();
        let config = StoreConfig::in_dir(dir.path());
        std::fs::write(
            config.customer_path(),
            "Customer ID,Name,Email,Total Purchases,Total Spent\n\
             a_1,A,a@x.com,3,9000.00\n\
             b_2,B,b@x.com,1,not-a-number\n\
             c_3,C,c@x.com,1,100.00\n",
        )?;

        let scan = service.identify_top_customers()?;
        assert_eq!(scan.top.len(), 1);
        assert_eq!(scan.top[0].customer_id.as_str(), "a_1");
        assert_eq!(scan.skipped.len(), 1);
        Ok(())
    }

    #[test]
    fn concurrent_purchases_never_overdraw_stock() {
        stockroom_observability::init();
        let service = Arc::new(InventoryService::new(Inventory::new(), MemoryStore::new()));
        let item = service
            .create_item("console", "brandc", Money::from_units(400), 5)
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|n| {
                let service = Arc::clone(&service);
                thread::spawn(move || {
                    service
                        .purchase_item(item, 1, "buyer", &format!("buyer{n}@x.com"))
                        .is_ok()
                })
            })
            .collect();

        let succeeded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(succeeded, 5);
        assert_eq!(service.get_item(item).unwrap().quantity(), 0);
        assert_eq!(service.ledger().unwrap().len(), 5);
        assert_eq!(service.store().persist_count(), 5);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 32,
            ..ProptestConfig::default()
        })]

        /// Property: writing the snapshot and filtering it yields exactly the
        /// customers whose in-memory total exceeds the threshold.
        #[test]
        fn persisted_top_spenders_match_memory(
            purchases in prop::collection::vec((0usize..4, 1i64..4), 1..25)
        ) {
            let dir = tempfile::tempdir().unwrap();
            let config = StoreConfig::in_dir(dir.path());
            let mut inv = Inventory::new();
            let item = inv.create_item("widget", "acme", Money::from_units(900), 1_000).unwrap();
            for (who, qty) in purchases {
                let email = format!("c{who}@x.com");
                inv.purchase_item(item, qty, "c", &email).unwrap();
            }

            files::write_customer_snapshot(&config.customer_path(), inv.customers()).unwrap();
            let rows = files::read_customer_snapshot(&config.customer_path()).unwrap();
            let scan = stockroom_inventory::identify_top_customers(rows, config.top_spender_threshold);

            prop_assert!(scan.skipped.is_empty());
            prop_assert_eq!(scan.top, inv.top_customers(config.top_spender_threshold));
        }
    }
}
