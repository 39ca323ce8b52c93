//! # Report Repository
//!
//! Read-only reporting queries for accounting.

use std::collections::BTreeMap;

use billing_core::{revenue_by_product, Money, ProductType, RevenueWindow, Transaction};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::ServiceResult;

/// Repository for reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Revenue per product for invoices dated inside `window`.
    ///
    /// ## How It's Computed
    /// ```text
    /// invoices dated in window ──► linked transactions (deduplicated)
    ///                                      │
    ///                                      ▼  re-derive dated amounts
    ///                        keep amounts dated in window, sum by product
    /// ```
    /// Amounts are recomputed from the transactions as they are now, so the
    /// report reflects the last reconciliation only if nothing changed since.
    pub async fn revenue_by_product(
        &self,
        window: RevenueWindow,
    ) -> ServiceResult<BTreeMap<ProductType, Money>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT
                id, contract_id, product, value_cents, start_date, end_date,
                billing_cadence, created_at, updated_at
            FROM transactions
            WHERE id IN (
                SELECT it.transaction_id
                FROM invoice_transactions it
                JOIN invoices i ON i.id = it.invoice_id
                WHERE (?1 IS NULL OR i.date >= ?1)
                  AND (?2 IS NULL OR i.date <= ?2)
            )
            ORDER BY created_at, rowid
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        debug!(
            transactions = transactions.len(),
            start = ?window.start,
            end = ?window.end,
            "Computing revenue by product"
        );

        Ok(revenue_by_product(&transactions, window)?)
    }
}
