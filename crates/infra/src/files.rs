//! Flat-file writers and readers.
//!
//! Every file is rewritten in full: contents go to a temporary file in the
//! same directory which is then renamed over the target, so readers never see
//! a half-written file.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::NamedTempFile;

use stockroom_inventory::{Customer, PurchaseLedger, SnapshotRow, StockReport};

use crate::error::StoreError;

pub const CUSTOMER_HEADER: [&str; 5] = [
    "Customer ID",
    "Name",
    "Email",
    "Total Purchases",
    "Total Spent",
];

pub const LEDGER_HEADER: [&str; 5] = [
    "Item ID",
    "Customer ID",
    "Quantity",
    "Purchase Amount",
    "Date",
];

/// Timestamp layout used in the ledger export and the report header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TOTAL_SPENT_COLUMN: usize = 4;

#[derive(Debug, Serialize)]
struct CustomerRow<'a> {
    customer_id: &'a str,
    name: &'a str,
    email: &'a str,
    total_purchases: usize,
    total_spent: String,
}

#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    item_id: u64,
    customer_id: &'a str,
    quantity: i64,
    purchase_amount: String,
    date: String,
}

fn write_atomically<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut File) -> Result<(), StoreError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Rewrite the customer snapshot: one row per customer, in creation order.
pub fn write_customer_snapshot<'a, I>(path: &Path, customers: I) -> Result<usize, StoreError>
where
    I: IntoIterator<Item = &'a Customer>,
{
    let mut rows = 0;
    write_atomically(path, |file| {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        wtr.write_record(CUSTOMER_HEADER)?;
        for customer in customers {
            wtr.serialize(CustomerRow {
                customer_id: customer.id_typed().as_str(),
                name: customer.name(),
                email: customer.email(),
                total_purchases: customer.purchase_count(),
                total_spent: customer.total_spent().to_string(),
            })?;
            rows += 1;
        }
        wtr.flush()?;
        Ok(())
    })?;
    tracing::info!(path = %path.display(), rows, "customer snapshot written");
    Ok(rows)
}

/// Rewrite the purchase ledger export in ledger order.
pub fn write_purchase_ledger(path: &Path, ledger: &PurchaseLedger) -> Result<usize, StoreError> {
    write_atomically(path, |file| {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        wtr.write_record(LEDGER_HEADER)?;
        for record in ledger {
            wtr.serialize(LedgerRow {
                item_id: record.item_id.get(),
                customer_id: record.customer_id.as_str(),
                quantity: record.quantity,
                purchase_amount: record.amount.to_string(),
                date: record.occurred_at.format(TIMESTAMP_FORMAT).to_string(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    })?;
    tracing::info!(path = %path.display(), rows = ledger.len(), "purchase ledger written");
    Ok(ledger.len())
}

/// Write the plain-text inventory report.
pub fn write_inventory_report(
    path: &Path,
    report: &StockReport,
    generated_at: DateTime<Utc>,
) -> Result<(), StoreError> {
    write_atomically(path, |file| {
        writeln!(file, "Inventory Report")?;
        writeln!(file, "Generated on: {}", generated_at.format(TIMESTAMP_FORMAT))?;
        writeln!(file)?;
        write!(file, "{report}")?;
        Ok(())
    })?;
    tracing::info!(path = %path.display(), items = report.lines().len(), "inventory report written");
    Ok(())
}

/// Read the customer snapshot back as raw rows for the top-spender scan.
///
/// Rows are returned unparsed; short rows yield empty fields, which the scan
/// reports as malformed.
pub fn read_customer_snapshot(path: &Path) -> Result<Vec<SnapshotRow>, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let header = rdr.headers()?.clone();
    if header.get(TOTAL_SPENT_COLUMN) != Some(CUSTOMER_HEADER[TOTAL_SPENT_COLUMN]) {
        return Err(StoreError::UnexpectedHeader {
            file: path.display().to_string(),
            found: header.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(idx as u64 + 2);
        rows.push(SnapshotRow {
            line,
            customer_id: record.get(0).unwrap_or_default().to_string(),
            total_spent: record.get(TOTAL_SPENT_COLUMN).unwrap_or_default().to_string(),
        });
    }
    Ok(rows)
}
