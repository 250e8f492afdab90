//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `wallet_wallets_created_total` - Wallets created
//! - `wallet_fundings_total` - Committed fundings
//! - `wallet_withdrawals_total` - Committed withdrawals
//! - `wallet_transfers_total` - Committed transfers
//! - `wallet_rejections_total` - Business-rule rejections
//! - `wallet_operation_duration_seconds` - Operation latency histogram

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Wallets created
    pub wallets_created_total: IntCounter,

    /// Committed fundings
    pub fundings_total: IntCounter,

    /// Committed withdrawals
    pub withdrawals_total: IntCounter,

    /// Committed transfers
    pub transfers_total: IntCounter,

    /// Business-rule rejections across all operations
    pub rejections_total: IntCounter,

    /// Operation latency histogram
    pub operation_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let wallets_created_total =
            IntCounter::new("wallet_wallets_created_total", "Wallets created")?;
        registry.register(Box::new(wallets_created_total.clone()))?;

        let fundings_total = IntCounter::new("wallet_fundings_total", "Committed fundings")?;
        registry.register(Box::new(fundings_total.clone()))?;

        let withdrawals_total =
            IntCounter::new("wallet_withdrawals_total", "Committed withdrawals")?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let transfers_total = IntCounter::new("wallet_transfers_total", "Committed transfers")?;
        registry.register(Box::new(transfers_total.clone()))?;

        let rejections_total =
            IntCounter::new("wallet_rejections_total", "Business-rule rejections")?;
        registry.register(Box::new(rejections_total.clone()))?;

        let operation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "wallet_operation_duration_seconds",
                "Operation latency histogram",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            wallets_created_total,
            fundings_total,
            withdrawals_total,
            transfers_total,
            rejections_total,
            operation_duration,
            registry,
        })
    }

    /// Record a wallet creation
    pub fn record_wallet_created(&self) {
        self.wallets_created_total.inc();
    }

    /// Record a committed funding
    pub fn record_funding(&self) {
        self.fundings_total.inc();
    }

    /// Record a committed withdrawal
    pub fn record_withdrawal(&self) {
        self.withdrawals_total.inc();
    }

    /// Record a committed transfer
    pub fn record_transfer(&self) {
        self.transfers_total.inc();
    }

    /// Record a business-rule rejection
    pub fn record_rejection(&self) {
        self.rejections_total.inc();
    }

    /// Record operation latency
    pub fn record_operation_duration(&self, duration_seconds: f64) {
        self.operation_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
