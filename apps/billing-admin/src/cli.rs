//! Command-line definitions.

use std::path::PathBuf;

use billing_core::{BillingCadence, ContractStatus, PaymentTerms, ProductType};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;

#[derive(Parser, Debug)]
#[command(name = "billing-admin", version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file (overrides BILLING_DB_PATH)
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Apply pending schema migrations and report the status
    Migrate,
    /// Derive, create and reconcile a contract's invoices
    Invoice {
        #[command(subcommand)]
        action: InvoiceCommand,
    },
    /// Revenue per product for invoices dated in a window
    Revenue {
        /// First invoice date included (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last invoice date included (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Manage customers
    Customer {
        #[command(subcommand)]
        action: CustomerCommand,
    },
    /// Manage contracts
    Contract {
        #[command(subcommand)]
        action: ContractCommand,
    },
    /// Manage transactions; reconcile the contract afterwards
    Transaction {
        #[command(subcommand)]
        action: TransactionCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum InvoiceCommand {
    /// Show the schedule the contract's transactions produce, writing nothing
    Preview { contract_id: String },
    /// Materialize the schedule for a contract that has no invoices yet
    Create { contract_id: String },
    /// Bring persisted invoices in line with the current transactions
    Reconcile { contract_id: String },
    /// List persisted invoices of a contract
    List { contract_id: String },
    /// Change an invoice's payment terms (due_upon_receipt, net_7, net_15, net_30)
    Terms {
        invoice_id: String,
        #[arg(value_parser = parse_wire::<PaymentTerms>)]
        terms: PaymentTerms,
    },
    /// Delete one invoice
    Delete { invoice_id: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CustomerCommand {
    /// List all customers
    List,
    /// Register a customer
    Create {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        address: AddressArgs,
    },
    /// Change a customer's name or address fields
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        address: AddressChangeArgs,
    },
    /// Delete a customer with all of its contracts and invoices
    Delete { id: String },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AddressArgs {
    #[arg(long)]
    pub address_line_1: String,
    #[arg(long)]
    pub address_line_2: Option<String>,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub state: String,
    #[arg(long)]
    pub zip_code: String,
    #[arg(long)]
    pub country: String,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressChangeArgs {
    #[arg(long)]
    pub address_line_1: Option<String>,
    #[arg(long)]
    pub address_line_2: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub zip_code: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ContractCommand {
    /// List a customer's contracts
    List { customer_id: String },
    /// Open a contract for a customer
    Create {
        #[arg(long)]
        customer_id: String,
        /// First day covered (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day covered (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        #[arg(long)]
        value_cents: i64,
    },
    /// Change contract fields
    Update {
        id: String,
        #[arg(long)]
        customer_id: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, value_parser = parse_wire::<ContractStatus>)]
        status: Option<ContractStatus>,
        #[arg(long)]
        value_cents: Option<i64>,
    },
    /// Delete a contract with its transactions and invoices
    Delete { id: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TransactionCommand {
    /// List a contract's transactions in creation order
    List { contract_id: String },
    /// Add a transaction to a contract
    Create {
        #[arg(long)]
        contract_id: String,
        /// rfq, implementation, core or fullsuite
        #[arg(long, value_parser = parse_wire::<ProductType>)]
        product: ProductType,
        #[arg(long)]
        value_cents: i64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// monthly, quarterly or annually
        #[arg(long, value_parser = parse_wire::<BillingCadence>, default_value = "monthly")]
        cadence: BillingCadence,
    },
    /// Change transaction fields
    Update {
        id: String,
        #[arg(long)]
        contract_id: Option<String>,
        #[arg(long, value_parser = parse_wire::<ProductType>)]
        product: Option<ProductType>,
        #[arg(long)]
        value_cents: Option<i64>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, value_parser = parse_wire::<BillingCadence>)]
        cadence: Option<BillingCadence>,
    },
    /// Delete a transaction
    Delete { id: String },
}

/// Parses an enum argument by its stored name (`net_30`, `quarterly`, ...).
fn parse_wire<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown value '{}'", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_invoice_reconcile() {
        let cli = Cli::try_parse_from(["billing-admin", "invoice", "reconcile", "c-1"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Invoice {
                action: InvoiceCommand::Reconcile {
                    contract_id: "c-1".to_string()
                }
            }
        );
        assert!(cli.db_path.is_none());
    }

    #[test]
    fn test_global_db_path_after_subcommand() {
        let cli = Cli::try_parse_from(["billing-admin", "migrate", "--db-path", "/tmp/b.db"]).unwrap();
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/b.db")));
        assert_eq!(cli.command, Command::Migrate);
    }

    #[test]
    fn test_parse_revenue_window() {
        let cli = Cli::try_parse_from(["billing-admin", "revenue", "--start", "2023-01-01"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Revenue {
                start: NaiveDate::from_ymd_opt(2023, 1, 1),
                end: None,
            }
        );
    }

    #[test]
    fn test_parse_transaction_create() {
        let cli = Cli::try_parse_from([
            "billing-admin",
            "transaction",
            "create",
            "--contract-id",
            "c-1",
            "--product",
            "implementation",
            "--value-cents",
            "40000",
            "--start",
            "2023-01-01",
            "--end",
            "2023-12-31",
            "--cadence",
            "quarterly",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Transaction {
                action: TransactionCommand::Create {
                    contract_id: "c-1".to_string(),
                    product: ProductType::Implementation,
                    value_cents: 40_000,
                    start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                    end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
                    cadence: BillingCadence::Quarterly,
                }
            }
        );
    }

    #[test]
    fn test_parse_invoice_terms_by_stored_name() {
        let cli = Cli::try_parse_from(["billing-admin", "invoice", "terms", "i-1", "net_30"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Invoice {
                action: InvoiceCommand::Terms {
                    invoice_id: "i-1".to_string(),
                    terms: PaymentTerms::Net30,
                }
            }
        );
        assert!(Cli::try_parse_from(["billing-admin", "invoice", "terms", "i-1", "net_60"]).is_err());
    }

    #[test]
    fn test_customer_update_fields_are_optional() {
        let cli = Cli::try_parse_from(["billing-admin", "customer", "update", "cu-1", "--city", "Salem"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Customer {
                action: CustomerCommand::Update {
                    id: "cu-1".to_string(),
                    name: None,
                    address: AddressChangeArgs {
                        city: Some("Salem".to_string()),
                        ..Default::default()
                    },
                }
            }
        );
    }

    #[test]
    fn test_bad_date_is_a_usage_error() {
        assert!(Cli::try_parse_from(["billing-admin", "revenue", "--end", "2023-13-01"]).is_err());
    }
}
