//! # Revenue Reporting
//!
//! Revenue per product over an optional date window, recomputed from the
//! transactions rather than read back from invoices. Invoices only store a
//! total per date, so the per-product split has to be re-derived.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::schedule::expand_transaction;
use crate::types::{ProductType, Transaction};

/// Inclusive reporting window. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RevenueWindow {
    #[ts(as = "Option<String>")]
    pub start: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end: Option<NaiveDate>,
}

impl RevenueWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        RevenueWindow { start, end }
    }

    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Sums the apportioned amounts of `transactions` that fall inside `window`,
/// grouped by product.
///
/// Products with nothing billed in the window are absent from the result.
/// A per-product total that leaves the `i64` range fails with
/// [`CoreError::AmountOverflow`].
pub fn revenue_by_product(
    transactions: &[Transaction],
    window: RevenueWindow,
) -> CoreResult<BTreeMap<ProductType, Money>> {
    let mut totals: BTreeMap<ProductType, Money> = BTreeMap::new();

    for transaction in transactions {
        for (date, amount) in expand_transaction(transaction)? {
            if window.contains(date) {
                let total = totals.entry(transaction.product).or_default();
                *total = total.checked_add(amount).ok_or(CoreError::AmountOverflow)?;
            }
        }
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::tests::{date, transaction};
    use crate::types::BillingCadence;

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = RevenueWindow::new(Some(date(2023, 1, 1)), Some(date(2023, 3, 31)));
        assert!(window.contains(date(2023, 1, 1)));
        assert!(window.contains(date(2023, 3, 31)));
        assert!(!window.contains(date(2022, 12, 31)));
        assert!(!window.contains(date(2023, 4, 1)));
        assert!(RevenueWindow::default().contains(date(1999, 1, 1)));
    }

    #[test]
    fn test_revenue_split_by_product() {
        let core = transaction("core", 120_000, date(2023, 1, 1), date(2023, 12, 31), BillingCadence::Monthly);
        let mut rfq = transaction("rfq", 7_500, date(2023, 2, 1), date(2023, 2, 28), BillingCadence::Monthly);
        rfq.product = ProductType::Rfq;

        let window = RevenueWindow::new(Some(date(2023, 1, 1)), Some(date(2023, 3, 31)));
        let totals = revenue_by_product(&[core, rfq], window).unwrap();

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&ProductType::Core].cents(), 30_000);
        assert_eq!(totals[&ProductType::Rfq].cents(), 7_500);
    }

    #[test]
    fn test_open_window_sums_everything() {
        let core = transaction("core", 100_001, date(2023, 1, 1), date(2023, 12, 31), BillingCadence::Quarterly);
        let totals = revenue_by_product(&[core], RevenueWindow::default()).unwrap();
        assert_eq!(totals[&ProductType::Core].cents(), 100_001);
    }

    #[test]
    fn test_nothing_in_window() {
        let core = transaction("core", 10_000, date(2023, 1, 1), date(2023, 1, 31), BillingCadence::Monthly);
        let window = RevenueWindow::new(Some(date(2024, 1, 1)), None);
        assert!(revenue_by_product(&[core], window).unwrap().is_empty());
    }

    #[test]
    fn test_product_total_overflow_is_an_error() {
        let huge = i64::MAX / 2 + 1;
        let a = transaction("a", huge, date(2023, 1, 1), date(2023, 12, 31), BillingCadence::Annually);
        let b = transaction("b", huge, date(2023, 1, 1), date(2023, 12, 31), BillingCadence::Annually);
        assert!(matches!(
            revenue_by_product(&[a, b], RevenueWindow::default()),
            Err(CoreError::AmountOverflow)
        ));
    }
}
