use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use accounts_service::config::Config;
use accounts_service::domain::accounts::{
    AccountInput, AccountsError, AccountsService, AuditContext, CustomerInput,
    RandomAccountNumberGenerator,
};
use accounts_service::metrics::{self, Metrics};
use accounts_service::store::{Database, InMemoryDatabase, PgDatabase};
use accounts_service::utils::{retry_on_transient, RetryConfig};

const SERVICE_ACTOR: &str = "ACCOUNTS_MS";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,accounts_service=debug"))
        )
        .init();

    tracing::info!("🚀 Starting Accounts Provisioning Service");

    let config = Config::from_env().context("Failed to load configuration")?;

    // === 1. Initialize Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);

    // actix-web needs its own system, so the metrics server gets a dedicated thread
    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    let contact = config.contact.clone();
    std::thread::spawn(move || {
        let system = actix_web::rt::System::new();
        let server = metrics::start_metrics_server(metrics_registry, contact, metrics_port);
        if let Err(e) = system.block_on(server) {
            tracing::error!("Metrics server error: {}", e);
        }
    });

    // === 2. Connect the store and run the lifecycle demo ===
    match config.database.url.as_deref() {
        Some(url) => {
            let retry = RetryConfig::default().with_max_attempts(config.database.connect_attempts);
            let max_connections = config.database.max_connections;

            let database = retry_on_transient(retry, |attempt| {
                tracing::info!(attempt = attempt, "Connecting to PostgreSQL...");
                PgDatabase::connect(url, max_connections)
            })
            .await
            .into_result()
            .context("Failed to connect to PostgreSQL")?;

            database.migrate().await.context("Failed to prepare schema")?;
            run_lifecycle(database, &config, metrics).await?;
        }
        None => {
            tracing::warn!("ACCOUNTS_DATABASE_URL not set, using the in-memory store");
            run_lifecycle(InMemoryDatabase::new(), &config, metrics).await?;
        }
    }

    tracing::info!("🎉 Demo complete! Metrics stay available until Ctrl+C");
    tokio::signal::ctrl_c().await?;

    Ok(())
}

/// Create, fetch, update and delete one customer/account pairing
async fn run_lifecycle<D: Database>(
    database: D,
    config: &Config,
    metrics: Arc<Metrics>,
) -> anyhow::Result<()> {
    let service = AccountsService::new(database, RandomAccountNumberGenerator, metrics)
        .with_defaults(config.provisioning.clone())
        .with_account_number_attempts(config.account_number_attempts);

    let input = CustomerInput::new("Madan Reddy", "madan@example.com", "9876543210");
    input.validate()?;

    match service.create_account(&input, &AuditContext::new(SERVICE_ACTOR)).await {
        Ok(()) => tracing::info!("✅ Account created"),
        Err(e @ AccountsError::DuplicateCustomer { .. }) => {
            tracing::info!(error = %e, "Customer left over from an earlier run, reusing it");
        }
        Err(e) => return Err(e.into()),
    }

    let view = service.fetch_account(&input.mobile_number).await?;
    tracing::info!(details = %serde_json::to_string(&view)?, "✅ Account fetched");

    // Admission check: the same mobile number is refused
    if let Err(e) = service.create_account(&input, &AuditContext::new(SERVICE_ACTOR)).await {
        tracing::info!(error = %e, client_error = e.is_client_error(), "Duplicate provisioning refused");
    }

    let changes = CustomerInput::new("Madan Kumar Reddy", "madan.reddy@example.com", "9876543210")
        .with_account(AccountInput {
            account_number: view.account.account_number,
            account_type: view.account.account_type.clone(),
            branch_address: "42 harbour road, montaza".to_string(),
        });
    changes.validate()?;

    let updated = service
        .update_account(&changes, &AuditContext::new(SERVICE_ACTOR))
        .await?;
    tracing::info!(updated = updated, "✅ Account updated");

    let deleted = service.delete_account(&input.mobile_number).await?;
    tracing::info!(deleted = deleted, "✅ Account deleted");

    Ok(())
}
