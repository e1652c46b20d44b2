//! Stock and top-spender reporting.

use core::fmt;

use serde::{Deserialize, Serialize};

use stockroom_core::{CustomerId, DomainError, ItemId, Money};

/// Total spend a customer must strictly exceed to count as a top spender.
pub const TOP_SPENDER_THRESHOLD: Money = Money::from_units(5000);

/// Stock status of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: i64,
    pub low_stock: bool,
}

impl StockLine {
    pub fn quantity_line(&self) -> String {
        format!("Item Name: {}, Quantity: {}", self.name, self.quantity)
    }

    pub fn warning_line(&self) -> Option<String> {
        self.low_stock.then(|| {
            format!(
                "WARNING: Low {} stock! Quantity: {}",
                self.name, self.quantity
            )
        })
    }
}

/// Point-in-time stock listing, one line per item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockReport {
    lines: Vec<StockLine>,
}

impl StockReport {
    pub fn new(lines: Vec<StockLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[StockLine] {
        &self.lines
    }

    pub fn low_stock(&self) -> impl Iterator<Item = &StockLine> + '_ {
        self.lines.iter().filter(|l| l.low_stock)
    }
}

/// Renders the body of the inventory report: each item's quantity line, its
/// warning line when low, then a blank line.
impl fmt::Display for StockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.quantity_line())?;
            if let Some(warning) = line.warning_line() {
                writeln!(f, "{warning}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A customer whose total spend exceeds the reporting threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopCustomer {
    pub customer_id: CustomerId,
    pub total_spent: Money,
}

/// The two fields of a persisted customer row the top-spender scan needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    /// 1-based line number in the source, for error reporting.
    pub line: u64,
    pub customer_id: String,
    pub total_spent: String,
}

/// Result of scanning persisted customer rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopCustomerScan {
    pub top: Vec<TopCustomer>,
    /// One `MalformedRecord` per row that could not be parsed.
    pub skipped: Vec<DomainError>,
}

/// Parse a persisted total as a plain number.
///
/// Any number of decimal places and exponent forms (`7.5e3`) are accepted,
/// since the file may have been edited by hand. Returns the exact value and
/// the amount rounded to cents.
fn parse_total(raw: &str) -> Result<(f64, Money), DomainError> {
    let invalid = || DomainError::invalid_argument(format!("not a number: {raw:?}"));
    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    let cents = (value * 100.0).round();
    if !cents.is_finite() || cents.abs() >= i64::MAX as f64 {
        return Err(invalid());
    }
    Ok((value, Money::from_cents(cents as i64)))
}

/// Select rows whose total spend strictly exceeds `threshold`.
///
/// Unparsable rows are collected in `skipped` and do not stop the scan.
pub fn identify_top_customers<I>(rows: I, threshold: Money) -> TopCustomerScan
where
    I: IntoIterator<Item = SnapshotRow>,
{
    let limit = threshold.cents() as f64 / 100.0;
    let mut scan = TopCustomerScan::default();
    for row in rows {
        let parsed = row
            .customer_id
            .parse::<CustomerId>()
            .and_then(|id| parse_total(&row.total_spent).map(|total| (id, total)));
        match parsed {
            Ok((customer_id, (value, total_spent))) => {
                if value > limit {
                    scan.top.push(TopCustomer {
                        customer_id,
                        total_spent,
                    });
                }
            }
            Err(e) => {
                tracing::warn!(line = row.line, error = %e, "skipping malformed customer row");
                scan.skipped.push(DomainError::malformed(row.line, e.to_string()));
            }
        }
    }
    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line: u64, id: &str, total: &str) -> SnapshotRow {
        SnapshotRow {
            line,
            customer_id: id.to_string(),
            total_spent: total.to_string(),
        }
    }

    #[test]
    fn renders_quantity_and_warning_lines() {
        let report = StockReport::new(vec![
            StockLine {
                item_id: ItemId::new(0),
                name: "Laptop".to_string(),
                quantity: 10,
                low_stock: false,
            },
            StockLine {
                item_id: ItemId::new(1),
                name: "Mouse".to_string(),
                quantity: 3,
                low_stock: true,
            },
        ]);
        let text = report.to_string();
        assert_eq!(
            text,
            "Item Name: Laptop, Quantity: 10\n\n\
             Item Name: Mouse, Quantity: 3\n\
             WARNING: Low Mouse stock! Quantity: 3\n\n"
        );
    }

    #[test]
    fn threshold_is_strict() {
        let scan = identify_top_customers(
            vec![
                row(2, "a_1", "5000.00"),
                row(3, "b_2", "5000.01"),
                row(4, "c_3", "6000"),
            ],
            TOP_SPENDER_THRESHOLD,
        );
        let ids: Vec<_> = scan.top.iter().map(|t| t.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["b_2", "c_3"]);
        assert!(scan.skipped.is_empty());
    }

    #[test]
    fn totals_accept_any_numeric_notation() {
        let scan = identify_top_customers(
            vec![
                row(2, "a_1", "5000.001"),
                row(3, "b_2", "7.5e3"),
                row(4, "c_3", "5e3"),
                row(5, "d_4", " 12000 "),
            ],
            TOP_SPENDER_THRESHOLD,
        );
        let ids: Vec<_> = scan.top.iter().map(|t| t.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["a_1", "b_2", "d_4"]);
        assert_eq!(scan.top[0].total_spent, Money::from_units(5000));
        assert_eq!(scan.top[1].total_spent, Money::from_units(7500));
        assert!(scan.skipped.is_empty());
    }

    #[test]
    fn non_finite_totals_are_malformed() {
        let scan = identify_top_customers(
            vec![row(2, "a_1", "inf"), row(3, "b_2", "NaN"), row(4, "c_3", "1e400")],
            TOP_SPENDER_THRESHOLD,
        );
        assert!(scan.top.is_empty());
        assert_eq!(scan.skipped.len(), 3);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let scan = identify_top_customers(
            vec![
                row(2, "a_1", "lots"),
                row(3, "", "9000"),
                row(4, "c_3", "9000"),
            ],
            TOP_SPENDER_THRESHOLD,
        );
        assert_eq!(scan.top.len(), 1);
        assert_eq!(scan.skipped.len(), 2);
        match &scan.skipped[0] {
            DomainError::MalformedRecord { line, .. } => assert_eq!(*line, 2),
            other => panic!("Expected MalformedRecord, got {other:?}"),
        }
    }
}
