//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Two Entry Points Per Entity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  XxxRepository (pool)                 fetch_* / insert_* (connection)   │
//! │  ────────────────────                 ───────────────────────────────   │
//! │  db.contracts().get(id)               contract::fetch_contract(conn,id) │
//! │       │                                     ▲                           │
//! │       └── acquire / begin ──► conn ─────────┘                           │
//! │                                                                         │
//! │  InvoicingService ── UnitOfWork::conn() ────┘                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories are the public API. The connection-level functions are
//! crate-private and let one unit of work span several entities.
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`] - Customers and their contracts/invoices
//! - [`ContractRepository`] - Contracts and their transactions/invoices
//! - [`TransactionRepository`] - Contract lines, batch creation
//! - [`InvoiceRepository`] - Persisted invoices and payment terms
//! - [`ReportRepository`] - Revenue reporting

pub mod contract;
pub mod customer;
pub mod invoice;
pub mod report;
pub mod transaction;

pub use contract::ContractRepository;
pub use customer::CustomerRepository;
pub use invoice::InvoiceRepository;
pub use report::ReportRepository;
pub use transaction::TransactionRepository;
