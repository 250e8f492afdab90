//! Ledger store over RocksDB
//!
//! # Column Families
//!
//! - `wallets` - Wallet rows (key: wallet_id)
//! - `wallet_by_user` - Unique user index (key: user_id, value: wallet_id)
//! - `journal` - Append-only journal entries (key: entry_id, UUIDv7)
//! - `journal_by_wallet` - Per-wallet journal index (key: wallet_id || entry_id)
//! - `idempotency` - Funding receipts (key: idempotency key)
//!
//! # Concurrency
//!
//! Wallet rows are the only shared mutable state. Every read-check-write
//! happens inside a [`TxnScope`], which holds striped row locks for its
//! whole lifetime and stages writes in a single `WriteBatch`. Commit is
//! one atomic RocksDB write; dropping a scope without committing discards
//! the batch, so partial mutations are never observable.
//!
//! Stripes are acquired in ascending index order with a bounded timeout,
//! which rules out deadlock between transfers running in opposite
//! directions.

use crate::{
    config::Config,
    error::{Error, Result},
    types::{JournalEntry, Wallet},
};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Column family names
const CF_WALLETS: &str = "wallets";
const CF_WALLET_BY_USER: &str = "wallet_by_user";
const CF_JOURNAL: &str = "journal";
const CF_JOURNAL_BY_WALLET: &str = "journal_by_wallet";
const CF_IDEMPOTENCY: &str = "idempotency";

/// Storage wrapper for RocksDB plus the row lock table
pub struct WalletStore {
    db: Arc<DB>,
    locks: Vec<Mutex<()>>,
    scope_timeout: Duration,
}

impl WalletStore {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_WALLETS, Self::cf_options_wallets()),
            ColumnFamilyDescriptor::new(CF_WALLET_BY_USER, Self::cf_options_indices()),
            ColumnFamilyDescriptor::new(CF_JOURNAL, Self::cf_options_journal()),
            ColumnFamilyDescriptor::new(CF_JOURNAL_BY_WALLET, Self::cf_options_indices()),
            ColumnFamilyDescriptor::new(CF_IDEMPOTENCY, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        let stripes = config.locking.stripes.max(1);
        let locks = (0..stripes).map(|_| Mutex::new(())).collect();

        tracing::info!(
            path = %path.display(),
            stripes,
            "Opened wallet store"
        );

        Ok(Self {
            db: Arc::new(db),
            locks,
            scope_timeout: Duration::from_millis(config.locking.scope_timeout_ms),
        })
    }

    // Column family options

    fn cf_options_wallets() -> Options {
        let mut opts = Options::default();
        // Wallet rows are hot, favour read speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_journal() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Row locks

    fn stripe(&self, id: &Uuid) -> usize {
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&id.as_bytes()[..8]);
        (u64::from_be_bytes(prefix) % self.locks.len() as u64) as usize
    }

    /// Acquire stripe locks for a set of row ids in ascending stripe order
    fn lock_rows(&self, ids: &[Uuid]) -> Result<Vec<MutexGuard<'_, ()>>> {
        let mut stripes: Vec<usize> = ids.iter().map(|id| self.stripe(id)).collect();
        stripes.sort_unstable();
        stripes.dedup();

        let mut guards = Vec::with_capacity(stripes.len());
        for stripe in stripes {
            let guard = self.locks[stripe].try_lock_for(self.scope_timeout).ok_or_else(|| {
                Error::LockTimeout(format!(
                    "row lock (stripe {}) not acquired within {:?}",
                    stripe, self.scope_timeout
                ))
            })?;
            guards.push(guard);
        }

        Ok(guards)
    }

    // Wallet reads

    /// Get wallet by ID
    pub fn wallet_by_id(&self, wallet_id: Uuid) -> Result<Option<Wallet>> {
        let cf = self.cf_handle(CF_WALLETS)?;

        match self.db.get_cf(cf, wallet_id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Get wallet by owning user (via the unique index)
    pub fn wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        let cf = self.cf_handle(CF_WALLET_BY_USER)?;

        let wallet_id = match self.db.get_cf(cf, user_id.as_bytes())? {
            Some(value) => {
                let bytes: [u8; 16] = value
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Storage("corrupt wallet_by_user index entry".to_string()))?;
                Uuid::from_bytes(bytes)
            }
            None => return Ok(None),
        };

        self.wallet_by_id(wallet_id)
    }

    // Wallet creation

    /// Insert a zero-balance wallet for a user, enforcing one wallet per user.
    ///
    /// The existence check and the insert run under the same user-keyed row
    /// lock, so a racing duplicate creation observes the first insert and
    /// returns `None` instead of leaving a second row.
    pub fn insert_wallet_unique(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        let _guard = self.lock_rows(&[user_id])?;

        if self.wallet_by_user(user_id)?.is_some() {
            return Ok(None);
        }

        let wallet = Wallet::new(user_id);

        let mut batch = WriteBatch::default();
        let cf_wallets = self.cf_handle(CF_WALLETS)?;
        batch.put_cf(cf_wallets, wallet.id.as_bytes(), bincode::serialize(&wallet)?);
        let cf_index = self.cf_handle(CF_WALLET_BY_USER)?;
        batch.put_cf(cf_index, user_id.as_bytes(), wallet.id.as_bytes());

        self.db.write(batch)?;

        tracing::info!(wallet_id = %wallet.id, user_id = %user_id, "Wallet created");

        Ok(Some(wallet))
    }

    // Transactional scopes

    /// Open a transaction scope over a set of wallet rows.
    ///
    /// Locks for all rows are held until the scope commits or drops.
    pub fn begin(&self, wallet_ids: &[Uuid]) -> Result<TxnScope<'_>> {
        let guards = self.lock_rows(wallet_ids)?;

        Ok(TxnScope {
            store: self,
            batch: WriteBatch::default(),
            staged: HashMap::new(),
            _guards: guards,
        })
    }

    // Journal reads

    /// All journal entries for a wallet, oldest first (UUIDv7 key order)
    pub fn entries_for_wallet(&self, wallet_id: Uuid) -> Result<Vec<JournalEntry>> {
        let cf_index = self.cf_handle(CF_JOURNAL_BY_WALLET)?;
        let cf_journal = self.cf_handle(CF_JOURNAL)?;

        let prefix: &[u8] = wallet_id.as_bytes().as_slice();
        let iter = self
            .db
            .iterator_cf(cf_index, IteratorMode::From(prefix, Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            if key.len() < 32 {
                return Err(Error::Storage("corrupt journal index entry".to_string()));
            }

            let entry_id_bytes: [u8; 16] = key[16..32]
                .try_into()
                .map_err(|_| Error::Storage("corrupt journal index entry".to_string()))?;

            let value = self
                .db
                .get_cf(cf_journal, entry_id_bytes)?
                .ok_or_else(|| Error::Storage("journal index points at missing entry".to_string()))?;

            entries.push(bincode::deserialize(&value)?);
        }

        Ok(entries)
    }

    // Idempotency

    /// Look up a recorded funding receipt
    pub fn fund_receipt(&self, key: &str) -> Result<Option<FundReceipt>> {
        let cf = self.cf_handle(CF_IDEMPOTENCY)?;

        match self.db.get_cf(cf, key.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }
}

/// Receipt recorded against a funding idempotency key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundReceipt {
    /// Journal entry the original funding committed
    pub entry_id: Uuid,

    /// Balance after the original funding
    pub balance: Decimal,

    /// When the original funding committed
    pub recorded_at: DateTime<Utc>,
}

/// Result of a conditional debit inside a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// Decrement staged; balance after the debit
    Applied {
        /// New balance
        balance: Decimal,
    },
    /// Balance was below the requested amount; nothing staged
    Insufficient {
        /// Current balance
        balance: Decimal,
    },
}

/// Transactional unit of work over one or two wallet rows.
///
/// All balance arithmetic happens here, under the row locks, so callers
/// never do read-then-write sequences of their own. Writes are staged in
/// a `WriteBatch` and become visible all at once on [`TxnScope::commit`].
/// Dropping the scope without committing is a rollback.
pub struct TxnScope<'a> {
    store: &'a WalletStore,
    batch: WriteBatch,
    staged: HashMap<Uuid, Wallet>,
    _guards: Vec<MutexGuard<'a, ()>>,
}

impl<'a> TxnScope<'a> {
    /// Read a wallet row, observing writes staged in this scope
    pub fn wallet(&self, wallet_id: Uuid) -> Result<Option<Wallet>> {
        if let Some(wallet) = self.staged.get(&wallet_id) {
            return Ok(Some(wallet.clone()));
        }
        self.store.wallet_by_id(wallet_id)
    }

    /// Atomic increment: `balance = balance + amount`
    pub fn credit(&mut self, wallet_id: Uuid, amount: Decimal) -> Result<Decimal> {
        let mut wallet = self.require_wallet(wallet_id)?;
        wallet.balance += amount;
        wallet.updated_at = Utc::now();
        let balance = wallet.balance;
        self.stage_wallet(wallet)?;
        Ok(balance)
    }

    /// Atomic conditional decrement: `balance = balance - amount` only if
    /// the balance covers the amount. Check and decrement are one step
    /// relative to other writers because the row lock is held.
    pub fn try_debit(&mut self, wallet_id: Uuid, amount: Decimal) -> Result<DebitOutcome> {
        let mut wallet = self.require_wallet(wallet_id)?;

        if wallet.balance < amount {
            return Ok(DebitOutcome::Insufficient {
                balance: wallet.balance,
            });
        }

        wallet.balance -= amount;
        wallet.updated_at = Utc::now();
        let balance = wallet.balance;
        self.stage_wallet(wallet)?;

        Ok(DebitOutcome::Applied { balance })
    }

    /// Stage a journal entry and its per-wallet index row
    pub fn append_entry(&mut self, entry: &JournalEntry) -> Result<()> {
        let cf_journal = self.store.cf_handle(CF_JOURNAL)?;
        self.batch
            .put_cf(cf_journal, entry.id.as_bytes(), bincode::serialize(entry)?);

        let cf_index = self.store.cf_handle(CF_JOURNAL_BY_WALLET)?;
        let mut key = entry.wallet_id.as_bytes().to_vec();
        key.extend_from_slice(entry.id.as_bytes());
        self.batch.put_cf(cf_index, &key, &[]);

        Ok(())
    }

    /// Stage a funding receipt against an idempotency key
    pub fn record_fund_receipt(&mut self, key: &str, receipt: &FundReceipt) -> Result<()> {
        let cf = self.store.cf_handle(CF_IDEMPOTENCY)?;
        self.batch
            .put_cf(cf, key.as_bytes(), bincode::serialize(receipt)?);
        Ok(())
    }

    /// Commit every staged write atomically
    pub fn commit(self) -> Result<()> {
        self.store.db.write(self.batch)?;
        Ok(())
    }

    fn require_wallet(&self, wallet_id: Uuid) -> Result<Wallet> {
        // Wallets are never deleted; a missing row here is storage corruption
        self.wallet(wallet_id)?
            .ok_or_else(|| Error::Storage(format!("wallet row missing: {}", wallet_id)))
    }

    fn stage_wallet(&mut self, wallet: Wallet) -> Result<()> {
        let cf = self.store.cf_handle(CF_WALLETS)?;
        self.batch
            .put_cf(cf, wallet.id.as_bytes(), bincode::serialize(&wallet)?);
        self.staged.insert(wallet.id, wallet);
        Ok(())
    }
}
