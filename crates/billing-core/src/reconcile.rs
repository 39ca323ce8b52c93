//! # Invoice Reconciliation Planning
//!
//! Diffs a contract's persisted invoices against its freshly derived
//! schedule and decides what to create, update and delete. Applying the plan
//! is the database layer's job; this module never touches storage.
//!
//! ## Decision Table
//! ```text
//! ┌──────────────────────────────┬───────────────────────────────────────────┐
//! │ persisted invoice on date D  │ action                                    │
//! ├──────────────────────────────┼───────────────────────────────────────────┤
//! │ D not in schedule            │ delete                                    │
//! │ D in schedule, same amount   │ nothing                                   │
//! │   and same transaction set   │                                           │
//! │ D in schedule, differs       │ update amount due + transaction set       │
//! │ second invoice on same D     │ delete (first one keeps the date)         │
//! ├──────────────────────────────┼───────────────────────────────────────────┤
//! │ schedule date, no invoice    │ create (payment terms: due upon receipt)  │
//! └──────────────────────────────┴───────────────────────────────────────────┘
//! ```

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::schedule::{InvoiceSchedule, ScheduledInvoice};
use crate::types::{Invoice, PaymentTerms};

/// An invoice to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceDraft {
    pub date: NaiveDate,
    pub payment_terms: PaymentTerms,
    pub amount_due: Money,
    pub transaction_ids: Vec<String>,
}

impl From<&ScheduledInvoice> for InvoiceDraft {
    fn from(scheduled: &ScheduledInvoice) -> Self {
        InvoiceDraft {
            date: scheduled.date,
            payment_terms: PaymentTerms::default(),
            amount_due: scheduled.amount_due(),
            transaction_ids: scheduled.transaction_ids().map(str::to_string).collect(),
        }
    }
}

/// New amount due and transaction set for an existing invoice.
///
/// Date and payment terms are left as they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceUpdate {
    pub invoice_id: String,
    pub date: NaiveDate,
    pub amount_due: Money,
    pub transaction_ids: Vec<String>,
}

/// What has to change to make persisted invoices match a schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    pub to_create: Vec<InvoiceDraft>,
    pub to_update: Vec<InvoiceUpdate>,
    /// Ids of invoices to delete.
    pub to_delete: Vec<String>,
}

impl ReconcilePlan {
    /// True when persisted invoices already match the schedule.
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Total number of writes the plan performs.
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }
}

fn differs(invoice: &Invoice, scheduled: &ScheduledInvoice) -> bool {
    if invoice.amount_due() != scheduled.amount_due() {
        return true;
    }
    let persisted: BTreeSet<&str> = invoice.transaction_ids.iter().map(String::as_str).collect();
    let expected: BTreeSet<&str> = scheduled.transaction_ids().collect();
    persisted != expected
}

/// Plans the writes that bring `existing` in line with `schedule`.
///
/// Updates are only planned for invoices whose amount due or contributing
/// transactions actually changed, so reconciling twice in a row yields an
/// empty plan the second time. An empty schedule deletes every invoice.
pub fn reconcile(existing: &[Invoice], schedule: &InvoiceSchedule) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    let mut claimed: HashSet<NaiveDate> = HashSet::with_capacity(existing.len());

    for invoice in existing {
        let Some(scheduled) = schedule.get(&invoice.date) else {
            plan.to_delete.push(invoice.id.clone());
            continue;
        };

        if !claimed.insert(invoice.date) {
            plan.to_delete.push(invoice.id.clone());
            continue;
        }

        if differs(invoice, scheduled) {
            plan.to_update.push(InvoiceUpdate {
                invoice_id: invoice.id.clone(),
                date: invoice.date,
                amount_due: scheduled.amount_due(),
                transaction_ids: scheduled.transaction_ids().map(str::to_string).collect(),
            });
        }
    }

    plan.to_create = schedule
        .iter()
        .filter(|scheduled| !claimed.contains(&scheduled.date))
        .map(InvoiceDraft::from)
        .collect();

    plan
}

/// Plans the first invoicing of a contract.
///
/// Invoicing is create-once-then-reconcile: if any invoice exists this fails
/// with [`CoreError::DuplicateInvoicing`] and plans nothing.
pub fn plan_initial_invoicing(
    contract_id: &str,
    existing: &[Invoice],
    schedule: &InvoiceSchedule,
) -> CoreResult<ReconcilePlan> {
    if !existing.is_empty() {
        return Err(CoreError::DuplicateInvoicing {
            contract_id: contract_id.to_string(),
            existing: existing.len(),
        });
    }

    Ok(ReconcilePlan {
        to_create: schedule.iter().map(InvoiceDraft::from).collect(),
        ..ReconcilePlan::default()
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
