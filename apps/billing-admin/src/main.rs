//! billing-admin entry point.

use std::process::ExitCode;

use billing_admin::{run, Cli};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Output serialization failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            error!(
                code = ?err.code,
                status = err.code.status_code(),
                "{}",
                err.message
            );
            if let Ok(text) = serde_json::to_string(&err) {
                eprintln!("{text}");
            }
            ExitCode::from(err.code.exit_code())
        }
    }
}

/// Initializes the tracing subscriber on stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,billing_core=debug,billing_db=debug,billing_admin=debug,sqlx=warn")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
