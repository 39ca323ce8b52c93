//! # billing-db: Database Layer for Billing Admin
//!
//! SQLite persistence for customers, contracts, transactions and invoices,
//! plus the invoicing service that keeps a contract's invoices in line with
//! its transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billing Data Flow                                │
//! │                                                                         │
//! │  billing-admin invoice reconcile <contract-id>                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     billing-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Invoicing    │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  Service      │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ContractLocks │    │ 001_initial  │  │   │
//! │  │   │ Repositories  │    │ UnitOfWork    │    │ _schema.sql  │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ derive + plan                  │   │
//! │  │                                ▼                                │   │
//! │  │                   billing-core (pure functions)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`repository`] - Repository implementations
//! - [`unit_of_work`] - Explicit transaction wrapper
//! - [`locks`] - Per-contract invoicing locks
//! - [`invoicing`] - Create / reconcile / preview invoicing runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billing_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("billing.db")).await?;
//!
//! let schedule = db.invoicing().preview(&contract_id).await?;
//! let outcome = db.invoicing().create_invoices(&contract_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoicing;
pub mod locks;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use invoicing::{InvoicingOutcome, InvoicingService};
pub use locks::ContractLocks;
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::{
    ContractRepository, CustomerRepository, InvoiceRepository, ReportRepository,
    TransactionRepository,
};
