//! Transfer engine: atomic two-wallet movements
//!
//! A transfer debits the sender, credits the recipient and stages both
//! journal entries inside one store scope. Either everything commits or
//! nothing does; a lone debit or a single journal entry is never
//! observable.

use crate::{
    directory::UserDirectory,
    error::Result,
    metrics::Metrics,
    outcome::{Outcome, RejectReason},
    store::{DebitOutcome, WalletStore},
    types::{ExternalId, JournalEntry, TransferSummary},
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates peer-to-peer transfers
#[derive(Clone)]
pub struct TransferEngine {
    store: Arc<WalletStore>,
    directory: Arc<dyn UserDirectory>,
    metrics: Metrics,
}

impl TransferEngine {
    /// New engine over a store and directory
    pub fn new(store: Arc<WalletStore>, directory: Arc<dyn UserDirectory>, metrics: Metrics) -> Self {
        Self {
            store,
            directory,
            metrics,
        }
    }

    /// Move `amount` from sender to recipient.
    ///
    /// Same-account and non-positive amounts are rejected before any
    /// directory or storage access. Both wallet rows are locked for the
    /// duration; an infrastructure failure at any point after the scope
    /// opens rolls the whole scope back.
    pub async fn transfer_funds(
        &self,
        sender_external_id: &ExternalId,
        recipient_external_id: &ExternalId,
        amount: Decimal,
    ) -> Result<Outcome<TransferSummary>> {
        if sender_external_id == recipient_external_id {
            self.metrics.record_rejection();
            return Ok(Outcome::rejected(RejectReason::SameAccount));
        }

        if amount <= Decimal::ZERO {
            self.metrics.record_rejection();
            return Ok(Outcome::rejected(RejectReason::InvalidAmount));
        }

        let start = Instant::now();

        let sender = self.directory.user_by_external_id(sender_external_id).await?;
        let recipient = self
            .directory
            .user_by_external_id(recipient_external_id)
            .await?;

        let (sender, recipient) = match (sender, recipient) {
            (Some(s), Some(r)) => (s, r),
            _ => {
                self.metrics.record_rejection();
                return Ok(Outcome::rejected(RejectReason::PartiesNotFound));
            }
        };

        let sender_wallet = self.store.wallet_by_user(sender.id)?;
        let recipient_wallet = self.store.wallet_by_user(recipient.id)?;

        let (sender_wallet, recipient_wallet) = match (sender_wallet, recipient_wallet) {
            (Some(s), Some(r)) => (s, r),
            _ => {
                self.metrics.record_rejection();
                return Ok(Outcome::rejected(RejectReason::WalletsNotFound));
            }
        };

        // One scope covers both rows and both journal entries; the store
        // acquires the locks in a deterministic order
        let mut scope = self.store.begin(&[sender_wallet.id, recipient_wallet.id])?;

        let sender_balance = match scope.try_debit(sender_wallet.id, amount)? {
            DebitOutcome::Applied { balance } => balance,
            DebitOutcome::Insufficient { balance } => {
                tracing::debug!(
                    sender_wallet = %sender_wallet.id,
                    %amount,
                    %balance,
                    "Transfer rejected"
                );
                self.metrics.record_rejection();
                return Ok(Outcome::rejected(RejectReason::InsufficientFunds));
            }
        };

        let recipient_balance = scope.credit(recipient_wallet.id, amount)?;

        scope.append_entry(&JournalEntry::transfer_debit(
            sender_wallet.id,
            amount,
            recipient_external_id,
        ))?;
        scope.append_entry(&JournalEntry::transfer_credit(
            recipient_wallet.id,
            amount,
            sender_external_id,
        ))?;

        scope.commit()?;

        self.metrics.record_transfer();
        self.metrics
            .record_operation_duration(start.elapsed().as_secs_f64());

        tracing::info!(
            sender_wallet = %sender_wallet.id,
            recipient_wallet = %recipient_wallet.id,
            %amount,
            "Transfer committed"
        );

        Ok(Outcome::completed(TransferSummary {
            amount,
            sender_balance,
            recipient_balance,
        }))
    }
}
