//! Wallet Ledger Engine
//!
//! Per-user monetary balances with an append-only journal of every
//! balance-changing event.
//!
//! # Architecture
//!
//! - **Ledger Store**: RocksDB rows with striped row locks and
//!   `WriteBatch`-backed transaction scopes
//! - **Transaction Journal**: immutable entries committed in the same
//!   scope as the mutation they document
//! - **Wallet Service**: creation, funding, withdrawal
//! - **Transfer Engine**: atomic two-wallet debit/credit pairs
//!
//! # Invariants
//!
//! - `balance >= 0` for every wallet at all times
//! - Every committed mutation is paired with exactly one journal entry
//! - A transfer commits two matched entries or none, never one
//! - One wallet per user

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod directory;
pub mod error;
pub mod journal;
pub mod metrics;
pub mod outcome;
pub mod registration;
pub mod screening;
pub mod store;
pub mod transfer;
pub mod types;
pub mod wallet;

// Re-exports
pub use config::Config;
pub use directory::{InMemoryDirectory, UserDirectory};
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use outcome::{Outcome, RejectReason};
pub use registration::RegistrationFlow;
pub use screening::{BlacklistGate, KarmaGate};
pub use store::{DebitOutcome, TxnScope, WalletStore};
pub use transfer::TransferEngine;
pub use types::{
    Direction, EntryStatus, EntryType, ExternalId, JournalEntry, TransferSummary, User, Wallet,
};
pub use wallet::WalletService;
