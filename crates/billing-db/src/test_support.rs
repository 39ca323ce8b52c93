//! Shared fixtures for database tests.

use billing_core::{
    Address, BillingCadence, Contract, Customer, NewContract, NewCustomer, NewTransaction,
    ProductType, Transaction,
};
use chrono::NaiveDate;

use crate::pool::{Database, DbConfig};

pub(crate) async fn database() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn address() -> Address {
    Address {
        address_line_1: "1 Main St".to_string(),
        address_line_2: None,
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip_code: "62701".to_string(),
        country: "US".to_string(),
    }
}

pub(crate) async fn seed_customer(db: &Database, name: &str) -> Customer {
    db.customers()
        .create(NewCustomer {
            name: name.to_string(),
            address: address(),
        })
        .await
        .unwrap()
}

/// A 2023 calendar-year contract for a fresh customer.
pub(crate) async fn seed_contract(db: &Database, value_cents: i64) -> (Customer, Contract) {
    let customer = seed_customer(db, "Acme Corp").await;
    let contract = db
        .contracts()
        .create(NewContract {
            customer_id: customer.id.clone(),
            start_date: date(2023, 1, 1),
            end_date: date(2023, 12, 31),
            value_cents,
        })
        .await
        .unwrap();
    (customer, contract)
}

/// A transaction covering calendar year 2023.
pub(crate) fn new_transaction(
    product: ProductType,
    value_cents: i64,
    billing_cadence: BillingCadence,
) -> NewTransaction {
    NewTransaction {
        product,
        value_cents,
        start_date: date(2023, 1, 1),
        end_date: date(2023, 12, 31),
        billing_cadence,
    }
}

/// $1,600.00 contract: core $1,200.00 monthly plus implementation $400.00
/// quarterly, already invoiced (12 invoices, revision 1).
pub(crate) async fn seed_invoiced_contract(db: &Database) -> (Contract, Vec<Transaction>) {
    let (_, contract) = seed_contract(db, 160_000).await;
    let transactions = db
        .transactions()
        .create_batch(
            &contract.id,
            vec![
                new_transaction(ProductType::Core, 120_000, BillingCadence::Monthly),
                new_transaction(ProductType::Implementation, 40_000, BillingCadence::Quarterly),
            ],
        )
        .await
        .unwrap();
    db.invoicing().create_invoices(&contract.id).await.unwrap();
    (contract, transactions)
}
