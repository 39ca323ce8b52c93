//! # billing-core: Pure Business Logic for Contract Billing
//!
//! Everything needed to turn contracts and their transactions into invoices,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billing Admin Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 billing-admin (operator CLI)                    │   │
//! │  │      invoice preview / create / reconcile, revenue report       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    billing-db (Database Layer)                  │   │
//! │  │     repositories, unit of work, invoicing service, locks        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ billing-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ schedule  │  │ reconcile │  │ validation│  │   │
//! │  │   │ Contract  │  │  periods  │  │  create   │  │   rules   │  │   │
//! │  │   │Transaction│  │  dates    │  │  update   │  │   checks  │  │   │
//! │  │   │  Invoice  │  │  amounts  │  │  delete   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Customer, Contract, Transaction, Invoice)
//! - [`money`] - Money type with integer arithmetic
//! - [`schedule`] - Invoice schedule derivation from transactions
//! - [`reconcile`] - Diffing persisted invoices against a schedule
//! - [`revenue`] - Revenue per product over a date window
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use billing_core::schedule::derive_invoice_schedule;
//! use billing_core::{BillingCadence, ProductType, Transaction};
//! use chrono::{NaiveDate, Utc};
//!
//! let now = Utc::now();
//! let yearly = Transaction {
//!     id: "t1".to_string(),
//!     contract_id: "c1".to_string(),
//!     product: ProductType::Core,
//!     value_cents: 100_000,
//!     start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
//!     end_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
//!     billing_cadence: BillingCadence::Quarterly,
//!     created_at: now,
//!     updated_at: now,
//! };
//!
//! let schedule = derive_invoice_schedule(&[yearly]).unwrap();
//! assert_eq!(schedule.len(), 4);
//! assert_eq!(schedule.total().cents(), 100_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod reconcile;
pub mod revenue;
pub mod schedule;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use reconcile::{plan_initial_invoicing, reconcile, InvoiceDraft, InvoiceUpdate, ReconcilePlan};
pub use revenue::{revenue_by_product, RevenueWindow};
pub use schedule::{derive_invoice_schedule, InvoiceSchedule, ScheduleLine, ScheduledInvoice};
pub use types::*;
