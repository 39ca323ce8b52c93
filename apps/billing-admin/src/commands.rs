//! # Command Handlers
//!
//! One handler per subcommand. Each returns the JSON document printed on
//! stdout; failures surface as [`AdminError`].
//!
//! Write commands are thin wrappers over the repositories. Editing or
//! deleting transactions does not touch invoices; run `invoice reconcile`
//! afterwards.

use billing_core::validation::validate_date_range;
use billing_core::{
    Address, AddressChanges, ContractChanges, CoreError, CustomerChanges, Money, NewContract,
    NewCustomer, NewTransaction, RevenueWindow, TransactionChanges,
};
use billing_db::migrations::migration_status;
use billing_db::Database;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::cli::{
    AddressArgs, AddressChangeArgs, Command, ContractCommand, CustomerCommand, InvoiceCommand,
    TransactionCommand,
};
use crate::error::{AdminError, AdminResult};

/// Runs one parsed command against `db`.
pub async fn execute(db: &Database, command: Command) -> AdminResult<Value> {
    debug!(?command, "Executing command");

    match command {
        Command::Migrate => migrate(db).await,
        Command::Invoice { action } => invoice(db, action).await,
        Command::Revenue { start, end } => revenue(db, RevenueWindow::new(start, end)).await,
        Command::Customer { action } => customer(db, action).await,
        Command::Contract { action } => contract(db, action).await,
        Command::Transaction { action } => transaction(db, action).await,
    }
}

async fn migrate(db: &Database) -> AdminResult<Value> {
    db.run_migrations().await?;
    let status = migration_status(db.pool()).await?;
    info!(applied = status.applied, total = status.total, "Schema is current");
    Ok(serde_json::to_value(status)?)
}

async fn invoice(db: &Database, action: InvoiceCommand) -> AdminResult<Value> {
    let invoicing = db.invoicing();

    match action {
        InvoiceCommand::Preview { contract_id } => {
            let schedule = invoicing.preview(&contract_id).await?;
            Ok(json!({
                "contract_id": contract_id,
                "total": schedule.total(),
                "invoices": schedule,
            }))
        }
        InvoiceCommand::Create { contract_id } => {
            let outcome = invoicing.create_invoices(&contract_id).await?;
            Ok(serde_json::to_value(outcome)?)
        }
        InvoiceCommand::Reconcile { contract_id } => {
            let outcome = invoicing.reconcile_invoices(&contract_id).await?;
            Ok(serde_json::to_value(outcome)?)
        }
        InvoiceCommand::List { contract_id } => {
            require_contract(db, &contract_id).await?;
            Ok(serde_json::to_value(
                db.invoices().list_for_contract(&contract_id).await?,
            )?)
        }
        InvoiceCommand::Terms { invoice_id, terms } => Ok(serde_json::to_value(
            db.invoices().set_payment_terms(&invoice_id, terms).await?,
        )?),
        InvoiceCommand::Delete { invoice_id } => {
            db.invoices().delete(&invoice_id).await?;
            Ok(json!({ "deleted": invoice_id }))
        }
    }
}

async fn customer(db: &Database, action: CustomerCommand) -> AdminResult<Value> {
    let customers = db.customers();

    match action {
        CustomerCommand::List => Ok(serde_json::to_value(customers.list().await?)?),
        CustomerCommand::Create { name, address } => {
            let created = customers
                .create(NewCustomer {
                    name,
                    address: address_from_args(address),
                })
                .await?;
            Ok(serde_json::to_value(created)?)
        }
        CustomerCommand::Update { id, name, address } => {
            let updated = customers
                .update(
                    &id,
                    CustomerChanges {
                        name,
                        address: address_changes(address),
                    },
                )
                .await?;
            Ok(serde_json::to_value(updated)?)
        }
        CustomerCommand::Delete { id } => {
            customers.delete(&id).await?;
            Ok(json!({ "deleted": id }))
        }
    }
}

async fn contract(db: &Database, action: ContractCommand) -> AdminResult<Value> {
    let contracts = db.contracts();

    match action {
        ContractCommand::List { customer_id } => {
            require_customer(db, &customer_id).await?;
            Ok(serde_json::to_value(
                contracts.list_for_customer(&customer_id).await?,
            )?)
        }
        ContractCommand::Create {
            customer_id,
            start,
            end,
            value_cents,
        } => {
            let created = contracts
                .create(NewContract {
                    customer_id,
                    start_date: start,
                    end_date: end,
                    value_cents,
                })
                .await?;
            Ok(serde_json::to_value(created)?)
        }
        ContractCommand::Update {
            id,
            customer_id,
            start,
            end,
            status,
            value_cents,
        } => {
            let updated = contracts
                .update(
                    &id,
                    ContractChanges {
                        customer_id,
                        start_date: start,
                        end_date: end,
                        status,
                        value_cents,
                    },
                )
                .await?;
            Ok(serde_json::to_value(updated)?)
        }
        ContractCommand::Delete { id } => {
            contracts.delete(&id).await?;
            Ok(json!({ "deleted": id }))
        }
    }
}

async fn transaction(db: &Database, action: TransactionCommand) -> AdminResult<Value> {
    let transactions = db.transactions();

    match action {
        TransactionCommand::List { contract_id } => {
            require_contract(db, &contract_id).await?;
            Ok(serde_json::to_value(
                db.contracts().transactions(&contract_id).await?,
            )?)
        }
        TransactionCommand::Create {
            contract_id,
            product,
            value_cents,
            start,
            end,
            cadence,
        } => {
            let created = transactions
                .create_batch(
                    &contract_id,
                    vec![NewTransaction {
                        product,
                        value_cents,
                        start_date: start,
                        end_date: end,
                        billing_cadence: cadence,
                    }],
                )
                .await?;
            Ok(serde_json::to_value(created)?)
        }
        TransactionCommand::Update {
            id,
            contract_id,
            product,
            value_cents,
            start,
            end,
            cadence,
        } => {
            let updated = transactions
                .update(
                    &id,
                    TransactionChanges {
                        contract_id,
                        product,
                        value_cents,
                        start_date: start,
                        end_date: end,
                        billing_cadence: cadence,
                    },
                )
                .await?;
            Ok(serde_json::to_value(updated)?)
        }
        TransactionCommand::Delete { id } => {
            let contract_id = transactions.delete(&id).await?;
            info!(
                transaction_id = %id,
                contract_id = %contract_id,
                "Reconcile the contract to bring its invoices up to date"
            );
            Ok(json!({ "deleted": id, "contract_id": contract_id }))
        }
    }
}

async fn revenue(db: &Database, window: RevenueWindow) -> AdminResult<Value> {
    if let (Some(start), Some(end)) = (window.start, window.end) {
        validate_date_range(start, end)?;
    }

    let by_product = db.reports().revenue_by_product(window).await?;
    let total =
        Money::checked_sum(by_product.values().copied()).ok_or(CoreError::AmountOverflow)?;

    Ok(json!({
        "window": window,
        "by_product": by_product,
        "total": total,
    }))
}

fn address_from_args(args: AddressArgs) -> Address {
    Address {
        address_line_1: args.address_line_1,
        address_line_2: args.address_line_2,
        city: args.city,
        state: args.state,
        zip_code: args.zip_code,
        country: args.country,
    }
}

/// `None` when no address flag was given.
fn address_changes(args: AddressChangeArgs) -> Option<AddressChanges> {
    if args == AddressChangeArgs::default() {
        return None;
    }
    Some(AddressChanges {
        address_line_1: args.address_line_1,
        address_line_2: args.address_line_2,
        city: args.city,
        state: args.state,
        zip_code: args.zip_code,
        country: args.country,
    })
}

async fn require_customer(db: &Database, id: &str) -> AdminResult<()> {
    match db.customers().get(id).await? {
        Some(_) => Ok(()),
        None => Err(AdminError::not_found("Customer", id)),
    }
}

async fn require_contract(db: &Database, id: &str) -> AdminResult<()> {
    match db.contracts().get(id).await? {
        Some(_) => Ok(()),
        None => Err(AdminError::not_found("Contract", id)),
    }
}
