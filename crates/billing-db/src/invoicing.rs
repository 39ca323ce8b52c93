//! # Invoicing Service
//!
//! Keeps a contract's persisted invoices in line with its transactions.
//!
//! ## One Invoicing Run
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_invoices(C) / reconcile_invoices(C)                             │
//! │                                                                         │
//! │  1. ContractLocks::lock(C)            in-process queue per contract     │
//! │  2. UnitOfWork::begin                 BEGIN                             │
//! │  3. claim_for_invoicing(C)            UPDATE ... invoice_revision + 1   │
//! │                                       (write lock; NotFound if missing) │
//! │  4. load transactions + invoices      same connection                   │
//! │  5. derive_invoice_schedule()         billing-core                      │
//! │  6. plan_initial_invoicing()          create path                       │
//! │     reconcile()                       reconcile path                    │
//! │  7. apply plan                        DELETE / UPDATE / INSERT          │
//! │  8. reload invoices, COMMIT                                             │
//! │                                                                         │
//! │  Any error before 8 drops the unit of work: ROLLBACK, revision kept.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billing_core::{
    derive_invoice_schedule, plan_initial_invoicing, reconcile, CoreResult, Invoice,
    InvoiceSchedule, ReconcilePlan,
};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult, ServiceResult};
use crate::locks::ContractLocks;
use crate::repository::{contract, invoice, transaction};
use crate::unit_of_work::UnitOfWork;

/// Result of a committed invoicing run.
#[derive(Debug, Clone, Serialize)]
pub struct InvoicingOutcome {
    pub contract_id: String,
    /// The contract's invoice revision after this run.
    pub revision: i64,
    /// What the run changed.
    pub plan: ReconcilePlan,
    /// The contract's invoices after commit, by date.
    pub invoices: Vec<Invoice>,
}

/// Creates and reconciles contract invoices.
#[derive(Debug, Clone)]
pub struct InvoicingService {
    pool: SqlitePool,
    locks: ContractLocks,
}

impl InvoicingService {
    pub fn new(pool: SqlitePool, locks: ContractLocks) -> Self {
        InvoicingService { pool, locks }
    }

    /// Derives the contract's schedule from its current transactions
    /// without writing anything.
    pub async fn preview(&self, contract_id: &str) -> ServiceResult<InvoiceSchedule> {
        let mut conn = self.pool.acquire().await?;
        if contract::fetch_contract(&mut conn, contract_id).await?.is_none() {
            return Err(DbError::not_found("Contract", contract_id).into());
        }

        let transactions = transaction::fetch_for_contract(&mut conn, contract_id).await?;
        let schedule = derive_invoice_schedule(&transactions)?;

        debug!(
            contract_id = %contract_id,
            transactions = transactions.len(),
            invoices = schedule.len(),
            total = %schedule.total(),
            "Schedule previewed"
        );
        Ok(schedule)
    }

    /// First invoicing of a contract.
    ///
    /// Fails with `CoreError::DuplicateInvoicing` and changes nothing if the
    /// contract already has invoices.
    pub async fn create_invoices(&self, contract_id: &str) -> ServiceResult<InvoicingOutcome> {
        self.run(contract_id, "create", |existing, schedule| {
            plan_initial_invoicing(contract_id, existing, schedule)
        })
        .await
    }

    /// Brings persisted invoices in line with the current transactions.
    ///
    /// Running it twice in a row changes nothing the second time.
    pub async fn reconcile_invoices(&self, contract_id: &str) -> ServiceResult<InvoicingOutcome> {
        self.run(contract_id, "reconcile", |existing, schedule| {
            Ok(reconcile(existing, schedule))
        })
        .await
    }

    async fn run<P>(&self, contract_id: &str, mode: &str, plan: P) -> ServiceResult<InvoicingOutcome>
    where
        P: FnOnce(&[Invoice], &InvoiceSchedule) -> CoreResult<ReconcilePlan>,
    {
        let _guard = self.locks.lock(contract_id).await;
        let mut uow = UnitOfWork::begin(&self.pool).await?;

        let claim = contract::claim_for_invoicing(uow.conn(), contract_id)
            .await?
            .ok_or_else(|| DbError::not_found("Contract", contract_id))?;

        let transactions = transaction::fetch_for_contract(uow.conn(), contract_id).await?;
        let schedule = derive_invoice_schedule(&transactions)?;
        let existing = invoice::fetch_for_contract(uow.conn(), contract_id).await?;
        let plan = plan(&existing, &schedule)?;

        debug!(
            contract_id = %contract_id,
            mode,
            create = plan.to_create.len(),
            update = plan.to_update.len(),
            delete = plan.to_delete.len(),
            "Invoicing plan ready"
        );

        apply_plan(uow.conn(), contract_id, &claim.customer_id, &plan).await?;
        let invoices = invoice::fetch_for_contract(uow.conn(), contract_id).await?;
        uow.commit().await?;

        info!(
            contract_id = %contract_id,
            mode,
            revision = claim.invoice_revision,
            created = plan.to_create.len(),
            updated = plan.to_update.len(),
            deleted = plan.to_delete.len(),
            invoices = invoices.len(),
            "Invoicing run committed"
        );

        Ok(InvoicingOutcome {
            contract_id: contract_id.to_string(),
            revision: claim.invoice_revision,
            plan,
            invoices,
        })
    }
}

/// Writes a plan. Deletes go first so a freed date can be reused.
async fn apply_plan(
    conn: &mut SqliteConnection,
    contract_id: &str,
    customer_id: &str,
    plan: &ReconcilePlan,
) -> DbResult<()> {
    for invoice_id in &plan.to_delete {
        invoice::delete_invoice(&mut *conn, invoice_id).await?;
    }
    for update in &plan.to_update {
        invoice::apply_update(&mut *conn, update).await?;
    }
    for draft in &plan.to_create {
        invoice::insert_invoice(&mut *conn, contract_id, customer_id, draft).await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::{database, date, new_transaction, seed_contract, seed_invoiced_contract};
    use billing_core::{
        BillingCadence, CoreError, PaymentTerms, ProductType, TransactionChanges,
    };

    #[tokio::test]
    async fn test_preview_writes_nothing() {
        let db = database().await;
        let (_, contract) = seed_contract(&db, 120_000).await;
        db.transactions()
            .create_batch(
                &contract.id,
                vec![new_transaction(ProductType::Core, 120_000, BillingCadence::Quarterly)],
            )
            .await
            .unwrap();

        let schedule = db.invoicing().preview(&contract.id).await.unwrap();
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule.total().cents(), 120_000);
        assert!(db.contracts().invoices(&contract.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_unknown_contract() {
        let db = database().await;
        assert!(matches!(
            db.invoicing().preview("ghost").await,
            Err(ServiceError::Db(DbError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_create_materializes_schedule() {
        let db = database().await;
        let (contract, _) = seed_invoiced_contract(&db).await;

        let invoices = db.contracts().invoices(&contract.id).await.unwrap();
        assert_eq!(invoices.len(), 12);
        let total: i64 = invoices.iter().map(|i| i.amount_due_cents).sum();
        assert_eq!(total, 160_000);
        assert!(invoices
            .iter()
            .all(|i| i.payment_terms == PaymentTerms::DueUponReceipt));
        assert!(invoices.iter().all(|i| i.customer_id == contract.customer_id));

        let stored = db.contracts().get(&contract.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice_revision, 1);
    }

    #[tokio::test]
    async fn test_second_create_is_rejected_without_side_effects() {
        let db = database().await;
        let (contract, _) = seed_invoiced_contract(&db).await;
        let before = db.contracts().invoices(&contract.id).await.unwrap();

        let result = db.invoicing().create_invoices(&contract.id).await;
        match result {
            Err(ServiceError::Core(CoreError::DuplicateInvoicing { existing, .. })) => {
                assert_eq!(existing, 12);
            }
            other => panic!("expected DuplicateInvoicing, got {:?}", other),
        }

        assert_eq!(db.contracts().invoices(&contract.id).await.unwrap(), before);
        let stored = db.contracts().get(&contract.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice_revision, 1);
    }

    #[tokio::test]
    async fn test_reconcile_twice_changes_nothing() {
        let db = database().await;
        let (contract, _) = seed_invoiced_contract(&db).await;
        let before = db.contracts().invoices(&contract.id).await.unwrap();

        let outcome = db.invoicing().reconcile_invoices(&contract.id).await.unwrap();
        assert!(outcome.plan.is_empty());
        assert_eq!(outcome.invoices, before);
        assert_eq!(outcome.revision, 2);
    }

    #[tokio::test]
    async fn test_reconcile_after_value_edit_updates_in_place() {
        let db = database().await;
        let (contract, transactions) = seed_invoiced_contract(&db).await;
        let before = db.contracts().invoices(&contract.id).await.unwrap();

        // Core: $1,200.00 → $2,400.00 over 12 months
        db.transactions()
            .update(
                &transactions[0].id,
                TransactionChanges {
                    value_cents: Some(240_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let outcome = db.invoicing().reconcile_invoices(&contract.id).await.unwrap();
        assert_eq!(outcome.plan.to_update.len(), 12);
        assert!(outcome.plan.to_create.is_empty());
        assert!(outcome.plan.to_delete.is_empty());

        for (old, new) in before.iter().zip(&outcome.invoices) {
            assert_eq!(old.id, new.id);
            assert_eq!(old.date, new.date);
            assert_eq!(new.amount_due_cents - old.amount_due_cents, 10_000);
        }
    }

    #[tokio::test]
    async fn test_reconcile_keeps_payment_terms() {
        let db = database().await;
        let (contract, transactions) = seed_invoiced_contract(&db).await;
        let first = db.contracts().invoices(&contract.id).await.unwrap().remove(0);
        db.invoices()
            .set_payment_terms(&first.id, PaymentTerms::Net15)
            .await
            .unwrap();

        db.transactions()
            .update(
                &transactions[0].id,
                TransactionChanges {
                    value_cents: Some(60_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        db.invoicing().reconcile_invoices(&contract.id).await.unwrap();

        let after = db.invoices().get(&first.id).await.unwrap().unwrap();
        assert_eq!(after.payment_terms, PaymentTerms::Net15);
        assert_eq!(after.amount_due_cents, 5_000 + 10_000);
    }

    #[tokio::test]
    async fn test_deleting_sole_contributor_removes_invoices() {
        let db = database().await;
        let (contract, transactions) = seed_invoiced_contract(&db).await;

        let extra = db
            .transactions()
            .create_batch(
                &contract.id,
                vec![{
                    let mut t = new_transaction(ProductType::Rfq, 5_000, BillingCadence::Monthly);
                    t.start_date = date(2024, 1, 1);
                    t.end_date = date(2024, 1, 31);
                    t
                }],
            )
            .await
            .unwrap()
            .remove(0);
        let outcome = db.invoicing().reconcile_invoices(&contract.id).await.unwrap();
        assert_eq!(outcome.plan.to_create.len(), 1);
        assert_eq!(outcome.invoices.len(), 13);

        let owner = db.transactions().delete(&extra.id).await.unwrap();
        let outcome = db.invoicing().reconcile_invoices(&owner).await.unwrap();
        assert_eq!(outcome.plan.to_delete.len(), 1);
        assert!(outcome.invoices.iter().all(|i| i.date < date(2024, 1, 1)));

        // Deleting a shared contributor shrinks the shared invoices instead
        db.transactions().delete(&transactions[1].id).await.unwrap();
        let outcome = db.invoicing().reconcile_invoices(&contract.id).await.unwrap();
        assert!(outcome.plan.to_delete.is_empty());
        assert_eq!(outcome.plan.to_update.len(), 4);
        assert!(outcome.invoices.iter().all(|i| i.amount_due_cents == 10_000));
    }

    #[tokio::test]
    async fn test_failed_run_rolls_back() {
        let db = database().await;
        let (contract, _) = seed_invoiced_contract(&db).await;
        let before = db.contracts().invoices(&contract.id).await.unwrap();

        // Bypasses validation to plant a transaction derivation rejects
        sqlx::query("UPDATE transactions SET end_date = '2000-01-01' WHERE contract_id = ?1")
            .bind(&contract.id)
            .execute(db.pool())
            .await
            .unwrap();

        let result = db.invoicing().reconcile_invoices(&contract.id).await;
        assert!(matches!(
            result,
            Err(ServiceError::Core(CoreError::InvalidDateRange { .. }))
        ));

        assert_eq!(db.contracts().invoices(&contract.id).await.unwrap(), before);
        let stored = db.contracts().get(&contract.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice_revision, 1);
    }

    #[tokio::test]
    async fn test_failed_write_mid_apply_rolls_back_deletes() {
        let db = database().await;
        let (contract, transactions) = seed_invoiced_contract(&db).await;
        let before = db.contracts().invoices(&contract.id).await.unwrap();

        // Core now bills on the 15th: 8 dates go away, 12 new dates appear
        db.transactions()
            .update(
                &transactions[0].id,
                TransactionChanges {
                    start_date: Some(date(2023, 1, 15)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let preview = db.invoicing().preview(&contract.id).await.unwrap();
        assert!(preview.get(&date(2023, 2, 1)).is_none());

        // Deletes and updates succeed, the first insert aborts
        sqlx::query(
            "CREATE TRIGGER reject_invoice_insert BEFORE INSERT ON invoices \
             BEGIN SELECT RAISE(ABORT, 'invoice inserts disabled'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let result = db.invoicing().reconcile_invoices(&contract.id).await;
        assert!(matches!(result, Err(ServiceError::Db(_))));

        assert_eq!(db.contracts().invoices(&contract.id).await.unwrap(), before);
        let stored = db.contracts().get(&contract.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice_revision, 1);
    }

    #[tokio::test]
    async fn test_overflowing_stored_values_roll_back() {
        let db = database().await;
        let (contract, _) = seed_invoiced_contract(&db).await;
        let before = db.contracts().invoices(&contract.id).await.unwrap();

        // Bypasses the value limit; together the two values exceed i64
        sqlx::query("UPDATE transactions SET value_cents = ?1 WHERE contract_id = ?2")
            .bind(i64::MAX / 2 + 1)
            .bind(&contract.id)
            .execute(db.pool())
            .await
            .unwrap();

        let result = db.invoicing().reconcile_invoices(&contract.id).await;
        assert!(matches!(
            result,
            Err(ServiceError::Core(CoreError::AmountOverflow))
        ));
        assert!(matches!(
            db.invoicing().preview(&contract.id).await,
            Err(ServiceError::Core(CoreError::AmountOverflow))
        ));

        assert_eq!(db.contracts().invoices(&contract.id).await.unwrap(), before);
        let stored = db.contracts().get(&contract.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice_revision, 1);
    }

    #[tokio::test]
    async fn test_unknown_contract_is_not_found() {
        let db = database().await;
        assert!(matches!(
            db.invoicing().reconcile_invoices("ghost").await,
            Err(ServiceError::Db(DbError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_creates_from_separate_handles_invoice_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("billing.db");

        // Two handles on one file share nothing in-process, not even locks
        let first = Database::new(DbConfig::new(&path)).await.unwrap();
        let second = Database::new(DbConfig::new(&path)).await.unwrap();

        let (_, contract) = seed_contract(&first, 120_000).await;
        first
            .transactions()
            .create_batch(
                &contract.id,
                vec![new_transaction(ProductType::Core, 120_000, BillingCadence::Monthly)],
            )
            .await
            .unwrap();

        let first_invoicing = first.invoicing();
        let second_invoicing = second.invoicing();
        let (a, b) = tokio::join!(
            first_invoicing.create_invoices(&contract.id),
            second_invoicing.create_invoices(&contract.id)
        );

        let (won, lost) = match (a, b) {
            (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
            other => panic!("expected exactly one successful run, got {:?}", other),
        };
        assert_eq!(won.invoices.len(), 12);
        assert!(matches!(
            lost,
            ServiceError::Core(CoreError::DuplicateInvoicing { existing: 12, .. })
        ));

        assert_eq!(second.contracts().invoices(&contract.id).await.unwrap().len(), 12);
        let stored = second.contracts().get(&contract.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice_revision, 1);

        first.close().await;
        second.close().await;
    }
}
