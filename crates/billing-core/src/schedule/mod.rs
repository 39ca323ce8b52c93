//! # Invoice Schedule Derivation
//!
//! Turns a contract's transactions into its invoice schedule.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    derive_invoice_schedule()                            │
//! │                                                                         │
//! │  for each Transaction                                                   │
//! │       │                                                                 │
//! │       ├──► count_periods()   (period.rs)    start, end, cadence → N     │
//! │       ├──► invoice_dates()   (dates.rs)     start, cadence, N → dates   │
//! │       └──► apportion()       (apportion.rs) value, N → amounts          │
//! │                 │                                                       │
//! │                 ▼  zip(dates, amounts)                                  │
//! │       InvoiceSchedule::add_line()  (grouping.rs)                        │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  InvoiceSchedule { date → ScheduledInvoice { lines, amount_due } }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This is the only place invoice amounts are computed. Both the create path
//! and reconciliation consume its output, so the persisted invoices of a
//! contract can always be rebuilt from its current transactions.

mod apportion;
mod dates;
mod grouping;
mod period;

pub use apportion::apportion;
pub use dates::{invoice_dates, InvoiceDates};
pub use grouping::{InvoiceSchedule, ScheduleLine, ScheduledInvoice};
pub use period::{count_periods, months_spanned};

use chrono::NaiveDate;

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::Transaction;

/// Expands one transaction into its dated, apportioned amounts.
///
/// ## Example
/// ```rust,ignore
/// // 2023-01-01..=2023-12-31, quarterly, $1,000.00
/// expand_transaction(&t)?
/// // [(2023-01-01, $250.00), (2023-04-01, $250.00),
/// //  (2023-07-01, $250.00), (2023-10-01, $250.00)]
/// ```
pub fn expand_transaction(transaction: &Transaction) -> CoreResult<Vec<(NaiveDate, Money)>> {
    let periods = count_periods(
        transaction.start_date,
        transaction.end_date,
        transaction.billing_cadence,
    )?;
    let amounts = apportion(transaction.value(), periods)?;
    let dates = invoice_dates(transaction.start_date, transaction.billing_cadence, periods);

    Ok(dates.zip(amounts).collect())
}

/// Derives the invoice schedule of a set of transactions.
///
/// Transactions are processed in the given order, which only affects the
/// order of lines within one date. An empty slice yields an empty schedule.
/// The first transaction with an inverted date range fails the whole
/// derivation.
pub fn derive_invoice_schedule(transactions: &[Transaction]) -> CoreResult<InvoiceSchedule> {
    let mut schedule = InvoiceSchedule::new();

    for transaction in transactions {
        for (date, amount) in expand_transaction(transaction)? {
            schedule.add_line(date, transaction.id.clone(), amount)?;
        }
    }

    Ok(schedule)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::{BillingCadence, ProductType};
    use chrono::Utc;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn transaction(
        id: &str,
        value_cents: i64,
        start: NaiveDate,
        end: NaiveDate,
        cadence: BillingCadence,
    ) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: id.to_string(),
            contract_id: "contract-1".to_string(),
            product: ProductType::Core,
            value_cents,
            start_date: start,
            end_date: end,
            billing_cadence: cadence,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_expand_quarterly_year() {
        let t = transaction(
            "t1",
            100_000,
            date(2023, 1, 1),
            date(2023, 12, 31),
            BillingCadence::Quarterly,
        );
        let lines = expand_transaction(&t).unwrap();
        assert_eq!(
            lines,
            vec![
                (date(2023, 1, 1), Money::from_cents(25_000)),
                (date(2023, 4, 1), Money::from_cents(25_000)),
                (date(2023, 7, 1), Money::from_cents(25_000)),
                (date(2023, 10, 1), Money::from_cents(25_000)),
            ]
        );
    }

    #[test]
    fn test_two_transactions_on_same_date_group() {
        let core = transaction(
            "core",
            30_000,
            date(2023, 1, 1),
            date(2023, 3, 31),
            BillingCadence::Monthly,
        );
        let implementation = transaction(
            "impl",
            5_000,
            date(2023, 3, 1),
            date(2023, 3, 31),
            BillingCadence::Monthly,
        );

        let schedule = derive_invoice_schedule(&[core, implementation]).unwrap();

        assert_eq!(schedule.len(), 3);
        let march = schedule.get(&date(2023, 3, 1)).unwrap();
        assert_eq!(march.amount_due().cents(), 15_000);
        assert_eq!(march.transaction_ids().collect::<Vec<_>>(), vec!["core", "impl"]);
        assert_eq!(schedule.total().cents(), 35_000);
    }

    #[test]
    fn test_schedule_total_matches_transaction_values() {
        let transactions = vec![
            transaction("a", 1_000_001, date(2023, 1, 31), date(2025, 6, 2), BillingCadence::Monthly),
            transaction("b", 77_777, date(2023, 2, 15), date(2024, 2, 14), BillingCadence::Quarterly),
            transaction("c", 500_000, date(2024, 2, 29), date(2027, 1, 1), BillingCadence::Annually),
        ];
        let schedule = derive_invoice_schedule(&transactions).unwrap();
        assert_eq!(schedule.total().cents(), 1_000_001 + 77_777 + 500_000);
    }

    #[test]
    fn test_no_transactions_yields_empty_schedule() {
        let schedule = derive_invoice_schedule(&[]).unwrap();
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_short_quarterly_range_still_bills_once() {
        let t = transaction("t", 9_000, date(2023, 1, 1), date(2023, 1, 31), BillingCadence::Quarterly);
        let schedule = derive_invoice_schedule(&[t]).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.total().cents(), 9_000);
    }

    #[test]
    fn test_overflowing_values_fail_derivation() {
        let huge = i64::MAX / 2 + 1;
        let a = transaction("a", huge, date(2023, 1, 1), date(2023, 12, 31), BillingCadence::Annually);
        let b = transaction("b", huge, date(2023, 1, 1), date(2023, 12, 31), BillingCadence::Annually);
        assert!(matches!(
            derive_invoice_schedule(&[a, b]),
            Err(CoreError::AmountOverflow)
        ));
    }

    #[test]
    fn test_inverted_range_fails_derivation() {
        let good = transaction("ok", 100, date(2023, 1, 1), date(2023, 1, 31), BillingCadence::Monthly);
        let bad = transaction("bad", 100, date(2023, 2, 1), date(2023, 1, 1), BillingCadence::Monthly);
        assert!(matches!(
            derive_invoice_schedule(&[good, bad]),
            Err(CoreError::InvalidDateRange { .. })
        ));
    }
}
