//! Wallet service: creation, funding, withdrawal
//!
//! Every balance mutation commits atomically with its journal entry
//! through a store scope. Business rejections come back as
//! [`Outcome::Rejected`]; only infrastructure failures use the error
//! channel, and those always mean the scope rolled back.

use crate::{
    directory::UserDirectory,
    error::Result,
    metrics::Metrics,
    outcome::{Outcome, RejectReason},
    store::{DebitOutcome, FundReceipt, WalletStore},
    types::{ExternalId, JournalEntry, User, Wallet},
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Wallet creation, funding and withdrawal
#[derive(Clone)]
pub struct WalletService {
    store: Arc<WalletStore>,
    directory: Arc<dyn UserDirectory>,
    metrics: Metrics,
}

impl WalletService {
    /// New service over a store and directory
    pub fn new(store: Arc<WalletStore>, directory: Arc<dyn UserDirectory>, metrics: Metrics) -> Self {
        Self {
            store,
            directory,
            metrics,
        }
    }

    /// Create the wallet for a user.
    ///
    /// Rejected with `WalletExists` if the user already holds one; the
    /// check and insert are atomic in the store, so a racing duplicate
    /// request cannot leave a second row.
    pub fn create_wallet(&self, user_id: Uuid) -> Result<Outcome<Wallet>> {
        match self.store.insert_wallet_unique(user_id)? {
            Some(wallet) => {
                self.metrics.record_wallet_created();
                Ok(Outcome::completed(wallet))
            }
            None => {
                self.metrics.record_rejection();
                Ok(Outcome::rejected(RejectReason::WalletExists))
            }
        }
    }

    /// Fund a wallet and return the new balance.
    ///
    /// An idempotency key, when supplied, makes retried requests safe: a
    /// key seen before replays the recorded balance instead of crediting
    /// again.
    pub async fn fund_wallet(
        &self,
        external_user_id: &ExternalId,
        amount: Decimal,
        idempotency_key: Option<&str>,
    ) -> Result<Outcome<Decimal>> {
        if amount <= Decimal::ZERO {
            self.metrics.record_rejection();
            return Ok(Outcome::rejected(RejectReason::InvalidAmount));
        }

        if let Some(key) = idempotency_key {
            if let Some(receipt) = self.store.fund_receipt(key)? {
                tracing::info!(%external_user_id, key, "Funding replayed from receipt");
                return Ok(Outcome::completed(receipt.balance));
            }
        }

        let start = Instant::now();

        let user = match self.resolve_user(external_user_id).await? {
            Some(user) => user,
            None => {
                self.metrics.record_rejection();
                return Ok(Outcome::rejected(RejectReason::UserNotFound));
            }
        };

        let wallet = match self.store.wallet_by_user(user.id)? {
            Some(wallet) => wallet,
            None => {
                self.metrics.record_rejection();
                return Ok(Outcome::rejected(RejectReason::WalletNotFound));
            }
        };

        let mut scope = self.store.begin(&[wallet.id])?;

        // Re-check the key under the row lock: a concurrent retry may have
        // committed between the unlocked check and here
        if let Some(key) = idempotency_key {
            if let Some(receipt) = self.store.fund_receipt(key)? {
                return Ok(Outcome::completed(receipt.balance));
            }
        }

        let balance = scope.credit(wallet.id, amount)?;
        let entry = JournalEntry::fund_credit(wallet.id, amount);
        scope.append_entry(&entry)?;

        if let Some(key) = idempotency_key {
            let receipt = FundReceipt {
                entry_id: entry.id,
                balance,
                recorded_at: Utc::now(),
            };
            scope.record_fund_receipt(key, &receipt)?;
        }

        scope.commit()?;

        self.metrics.record_funding();
        self.metrics
            .record_operation_duration(start.elapsed().as_secs_f64());

        tracing::info!(
            wallet_id = %wallet.id,
            %amount,
            %balance,
            "Wallet funded"
        );

        Ok(Outcome::completed(balance))
    }

    /// Withdraw from a wallet and return the new balance.
    ///
    /// The balance check and decrement are one store-side step under the
    /// row lock, so concurrent withdrawals cannot both pass a stale check.
    pub async fn withdraw(
        &self,
        external_user_id: &ExternalId,
        amount: Decimal,
    ) -> Result<Outcome<Decimal>> {
        if amount <= Decimal::ZERO {
            self.metrics.record_rejection();
            return Ok(Outcome::rejected(RejectReason::InvalidAmount));
        }

        let start = Instant::now();

        let user = match self.resolve_user(external_user_id).await? {
            Some(user) => user,
            None => {
                self.metrics.record_rejection();
                return Ok(Outcome::rejected(RejectReason::UserNotFound));
            }
        };

        let wallet = match self.store.wallet_by_user(user.id)? {
            Some(wallet) => wallet,
            None => {
                self.metrics.record_rejection();
                return Ok(Outcome::rejected(RejectReason::WalletNotFound));
            }
        };

        let mut scope = self.store.begin(&[wallet.id])?;

        let balance = match scope.try_debit(wallet.id, amount)? {
            DebitOutcome::Applied { balance } => balance,
            DebitOutcome::Insufficient { balance } => {
                tracing::debug!(wallet_id = %wallet.id, %amount, %balance, "Withdrawal rejected");
                self.metrics.record_rejection();
                return Ok(Outcome::rejected(RejectReason::InsufficientBalance));
            }
        };

        scope.append_entry(&JournalEntry::withdraw_debit(wallet.id, amount))?;
        scope.commit()?;

        self.metrics.record_withdrawal();
        self.metrics
            .record_operation_duration(start.elapsed().as_secs_f64());

        tracing::info!(
            wallet_id = %wallet.id,
            %amount,
            %balance,
            "Withdrawal committed"
        );

        Ok(Outcome::completed(balance))
    }

    async fn resolve_user(&self, external_id: &ExternalId) -> Result<Option<User>> {
        self.directory.user_by_external_id(external_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::directory::InMemoryDirectory;
    use crate::types::{Direction, EntryStatus, EntryType};
    use tempfile::TempDir;

    struct Fixture {
        service: WalletService,
        store: Arc<WalletStore>,
        directory: Arc<InMemoryDirectory>,
        _temp: TempDir,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp.path().to_path_buf();

        let store = Arc::new(WalletStore::open(&config).unwrap());
        let directory = Arc::new(InMemoryDirectory::new());
        let service = WalletService::new(
            store.clone(),
            directory.clone(),
            Metrics::new().unwrap(),
        );

        Fixture {
            service,
            store,
            directory,
            _temp: temp,
        }
    }

    fn seed_user(directory: &InMemoryDirectory, external: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            external_id: ExternalId::new(external),
            name: external.to_string(),
            email: format!("{}@example.com", external),
        };
        directory.insert(user.clone());
        user
    }

    #[tokio::test]
    async fn test_create_wallet_once() {
        let fx = fixture();
        let user = seed_user(&fx.directory, "alice");

        let outcome = fx.service.create_wallet(user.id).unwrap();
        assert!(outcome.is_completed());

        let outcome = fx.service.create_wallet(user.id).unwrap();
        match outcome {
            Outcome::Rejected { reason, .. } => assert_eq!(reason, RejectReason::WalletExists),
            Outcome::Completed { .. } => panic!("duplicate creation must be rejected"),
        }
    }

    #[tokio::test]
    async fn test_fund_from_zero() {
        let fx = fixture();
        let user = seed_user(&fx.directory, "alice");
        fx.service.create_wallet(user.id).unwrap();

        let outcome = fx
            .service
            .fund_wallet(&user.external_id, Decimal::new(100000, 2), None)
            .await
            .unwrap();
        assert_eq!(outcome.data(), Some(&Decimal::new(100000, 2)));

        let wallet = fx.store.wallet_by_user(user.id).unwrap().unwrap();
        assert_eq!(wallet.balance, Decimal::new(100000, 2));

        let entries = fx.store.entries_for_wallet(wallet.id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, EntryType::Fund);
        assert_eq!(entries[0].direction, Direction::Credit);
        assert_eq!(entries[0].status, EntryStatus::Success);
    }

    #[tokio::test]
    async fn test_fund_rejects_unknown_user() {
        let fx = fixture();
        let outcome = fx
            .service
            .fund_wallet(&ExternalId::new("ghost"), Decimal::ONE, None)
            .await
            .unwrap();
        match outcome {
            Outcome::Rejected { reason, .. } => assert_eq!(reason, RejectReason::UserNotFound),
            Outcome::Completed { .. } => panic!("unknown user must be rejected"),
        }
    }

    #[tokio::test]
    async fn test_fund_rejects_missing_wallet() {
        let fx = fixture();
        let user = seed_user(&fx.directory, "alice");

        let outcome = fx
            .service
            .fund_wallet(&user.external_id, Decimal::ONE, None)
            .await
            .unwrap();
        match outcome {
            Outcome::Rejected { reason, .. } => assert_eq!(reason, RejectReason::WalletNotFound),
            Outcome::Completed { .. } => panic!("missing wallet must be rejected"),
        }
    }

    #[tokio::test]
    async fn test_fund_rejects_non_positive_amount() {
        let fx = fixture();
        let user = seed_user(&fx.directory, "alice");
        fx.service.create_wallet(user.id).unwrap();

        let outcome = fx
            .service
            .fund_wallet(&user.external_id, Decimal::ZERO, None)
            .await
            .unwrap();
        match outcome {
            Outcome::Rejected { reason, .. } => assert_eq!(reason, RejectReason::InvalidAmount),
            Outcome::Completed { .. } => panic!("zero amount must be rejected"),
        }
    }

    #[tokio::test]
    async fn test_fund_idempotency_key_replays() {
        let fx = fixture();
        let user = seed_user(&fx.directory, "alice");
        fx.service.create_wallet(user.id).unwrap();

        let first = fx
            .service
            .fund_wallet(&user.external_id, Decimal::new(100000, 2), Some("req-1"))
            .await
            .unwrap();
        assert_eq!(first.data(), Some(&Decimal::new(100000, 2)));

        // Same key: replay, no second credit
        let replay = fx
            .service
            .fund_wallet(&user.external_id, Decimal::new(100000, 2), Some("req-1"))
            .await
            .unwrap();
        assert_eq!(replay.data(), Some(&Decimal::new(100000, 2)));

        let wallet = fx.store.wallet_by_user(user.id).unwrap().unwrap();
        assert_eq!(wallet.balance, Decimal::new(100000, 2));
        assert_eq!(fx.store.entries_for_wallet(wallet.id).unwrap().len(), 1);

        // Fresh key: independent funding
        let second = fx
            .service
            .fund_wallet(&user.external_id, Decimal::new(100000, 2), Some("req-2"))
            .await
            .unwrap();
        assert_eq!(second.data(), Some(&Decimal::new(200000, 2)));
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_leaves_no_trace() {
        let fx = fixture();
        let user = seed_user(&fx.directory, "alice");
        fx.service.create_wallet(user.id).unwrap();
        fx.service
            .fund_wallet(&user.external_id, Decimal::new(100000, 2), None)
            .await
            .unwrap();

        let outcome = fx
            .service
            .withdraw(&user.external_id, Decimal::new(150000, 2))
            .await
            .unwrap();
        match outcome {
            Outcome::Rejected { reason, message } => {
                assert_eq!(reason, RejectReason::InsufficientBalance);
                assert_eq!(message, "Insufficient balance");
            }
            Outcome::Completed { .. } => panic!("overdraft must be rejected"),
        }

        let wallet = fx.store.wallet_by_user(user.id).unwrap().unwrap();
        assert_eq!(wallet.balance, Decimal::new(100000, 2));
        // No journal row for the rejected withdrawal
        assert_eq!(fx.store.entries_for_wallet(wallet.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_withdraw_commits_debit_entry() {
        let fx = fixture();
        let user = seed_user(&fx.directory, "alice");
        fx.service.create_wallet(user.id).unwrap();
        fx.service
            .fund_wallet(&user.external_id, Decimal::new(100000, 2), None)
            .await
            .unwrap();

        let outcome = fx
            .service
            .withdraw(&user.external_id, Decimal::new(40000, 2))
            .await
            .unwrap();
        assert_eq!(outcome.data(), Some(&Decimal::new(60000, 2)));

        let wallet = fx.store.wallet_by_user(user.id).unwrap().unwrap();
        let entries = fx.store.entries_for_wallet(wallet.id).unwrap();
        assert_eq!(entries.len(), 2);
        let debit = entries
            .iter()
            .find(|e| e.direction == Direction::Debit)
            .unwrap();
        assert_eq!(debit.entry_type, EntryType::Withdraw);
        assert_eq!(debit.amount, Decimal::new(40000, 2));
    }
}
