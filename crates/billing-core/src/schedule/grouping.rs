//! # Invoice Grouper
//!
//! Merges per-transaction `(date, amount)` contributions into one entry per
//! invoice date.
//!
//! ```text
//! T1: 2023-03-01 $100.00 ─┐
//!                         ├──► 2023-03-01: [T1 $100.00, T2 $50.00]  due $150.00
//! T2: 2023-03-01  $50.00 ─┘
//! T2: 2023-04-01  $50.00 ────► 2023-04-01: [T2 $50.00]              due  $50.00
//! ```

use std::collections::btree_map::{self, BTreeMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// One transaction's share of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleLine {
    pub transaction_id: String,
    pub amount: Money,
}

/// Everything due on one invoice date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledInvoice {
    pub date: NaiveDate,
    /// Contributing lines, in the order transactions were grouped.
    pub lines: Vec<ScheduleLine>,
    amount_due: Money,
}

impl ScheduledInvoice {
    fn new(date: NaiveDate) -> Self {
        ScheduledInvoice {
            date,
            lines: Vec::new(),
            amount_due: Money::zero(),
        }
    }

    /// Sum of all line amounts.
    #[inline]
    pub fn amount_due(&self) -> Money {
        self.amount_due
    }

    /// Ids of the contributing transactions, in line order.
    pub fn transaction_ids(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.transaction_id.as_str())
    }
}

/// The derived invoice schedule of a contract: invoice date → amount due.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InvoiceSchedule {
    invoices: BTreeMap<NaiveDate, ScheduledInvoice>,
    #[serde(skip)]
    total: Money,
}

impl InvoiceSchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        InvoiceSchedule::default()
    }

    /// Adds one transaction's contribution on `date`.
    ///
    /// Fails with `CoreError::AmountOverflow`, leaving the schedule
    /// unchanged, if the date's amount due or the schedule total would
    /// overflow.
    pub fn add_line(
        &mut self,
        date: NaiveDate,
        transaction_id: impl Into<String>,
        amount: Money,
    ) -> CoreResult<()> {
        let current = self.invoices.get(&date).map_or(Money::zero(), |i| i.amount_due);
        let amount_due = current.checked_add(amount).ok_or(CoreError::AmountOverflow)?;
        let total = self.total.checked_add(amount).ok_or(CoreError::AmountOverflow)?;

        let invoice = self
            .invoices
            .entry(date)
            .or_insert_with(|| ScheduledInvoice::new(date));
        invoice.lines.push(ScheduleLine {
            transaction_id: transaction_id.into(),
            amount,
        });
        invoice.amount_due = amount_due;
        self.total = total;
        Ok(())
    }

    /// The entry for `date`, if any transaction bills on it.
    pub fn get(&self, date: &NaiveDate) -> Option<&ScheduledInvoice> {
        self.invoices.get(date)
    }

    /// Whether any transaction bills on `date`.
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.invoices.contains_key(date)
    }

    /// Scheduled invoices in date order.
    pub fn iter(&self) -> btree_map::Values<'_, NaiveDate, ScheduledInvoice> {
        self.invoices.values()
    }

    /// Invoice dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.invoices.keys().copied()
    }

    /// Number of distinct invoice dates.
    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    /// Total billed across the whole schedule.
    pub fn total(&self) -> Money {
        self.total
    }
}

impl<'a> IntoIterator for &'a InvoiceSchedule {
    type Item = &'a ScheduledInvoice;
    type IntoIter = btree_map::Values<'a, NaiveDate, ScheduledInvoice>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_same_date_lines_merge() {
        let mut schedule = InvoiceSchedule::new();
        schedule.add_line(date(2023, 3, 1), "t1", Money::from_cents(10_000)).unwrap();
        schedule.add_line(date(2023, 3, 1), "t2", Money::from_cents(5_000)).unwrap();

        assert_eq!(schedule.len(), 1);
        let march = schedule.get(&date(2023, 3, 1)).unwrap();
        assert_eq!(march.amount_due().cents(), 15_000);
        assert_eq!(march.transaction_ids().collect::<Vec<_>>(), vec!["t1", "t2"]);
    }

    #[test]
    fn test_dates_are_ordered_and_total_adds_up() {
        let mut schedule = InvoiceSchedule::new();
        schedule.add_line(date(2023, 5, 1), "t1", Money::from_cents(300)).unwrap();
        schedule.add_line(date(2023, 1, 1), "t1", Money::from_cents(200)).unwrap();
        schedule.add_line(date(2023, 3, 1), "t2", Money::from_cents(100)).unwrap();

        assert_eq!(
            schedule.dates().collect::<Vec<_>>(),
            vec![date(2023, 1, 1), date(2023, 3, 1), date(2023, 5, 1)]
        );
        assert_eq!(schedule.total().cents(), 600);
        assert!(!schedule.contains(&date(2023, 2, 1)));
    }

    #[test]
    fn test_serializes_as_date_map() {
        let mut schedule = InvoiceSchedule::new();
        schedule.add_line(date(2023, 3, 1), "t1", Money::from_cents(150)).unwrap();

        let json = serde_json::to_value(&schedule).unwrap();
        assert_eq!(json["2023-03-01"]["amount_due"], 150);
        assert_eq!(json["2023-03-01"]["lines"][0]["transaction_id"], "t1");
    }

    #[test]
    fn test_overflowing_line_is_rejected_and_schedule_kept() {
        let half = Money::from_cents(i64::MAX / 2 + 1);
        let mut schedule = InvoiceSchedule::new();
        schedule.add_line(date(2023, 1, 1), "t1", half).unwrap();

        // Same date: the amount due would overflow.
        assert!(matches!(
            schedule.add_line(date(2023, 1, 1), "t2", half),
            Err(CoreError::AmountOverflow)
        ));
        // Other date: the schedule total would overflow.
        assert!(matches!(
            schedule.add_line(date(2024, 1, 1), "t2", half),
            Err(CoreError::AmountOverflow)
        ));

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.total(), half);
        assert_eq!(schedule.get(&date(2023, 1, 1)).unwrap().lines.len(), 1);
    }
}
