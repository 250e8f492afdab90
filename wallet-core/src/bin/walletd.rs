//! Wallet ledger service binary

use std::sync::Arc;
use wallet_core::{Config, InMemoryDirectory, Metrics, TransferEngine, WalletService, WalletStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting wallet ledger service");

    // Load configuration
    let config = Config::from_env()?;

    let store = Arc::new(WalletStore::open(&config)?);
    let directory = Arc::new(InMemoryDirectory::new());
    let metrics = Metrics::new()?;

    let _wallets = WalletService::new(store.clone(), directory.clone(), metrics.clone());
    let _transfers = TransferEngine::new(store, directory, metrics);
    tracing::info!(service = %config.service_name, "Wallet ledger ready");

    // TODO: mount the HTTP surface once the gateway contract lands
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down wallet ledger service");
    Ok(())
}
