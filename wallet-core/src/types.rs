//! Core types for the wallet ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)
//! - Append-only journal rows (UUIDv7 keys for time-ordering)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// External user identity (issued by the directory, opaque to the ledger)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalId(String);

impl ExternalId {
    /// Create new external ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identity record, owned by the external directory.
///
/// The ledger only ever reads users; `id` is the internal key wallets
/// reference, `external_id` is what callers present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Internal primary key
    pub id: Uuid,

    /// External identity (unique, stable)
    pub external_id: ExternalId,

    /// Display name
    pub name: String,

    /// Email address (screened at registration)
    pub email: String,
}

/// The mutable balance record owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique wallet ID
    pub id: Uuid,

    /// Owning user (unique across wallets)
    pub user_id: Uuid,

    /// Current balance (exact decimal, never negative)
    pub balance: Decimal,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// New zero-balance wallet for a user
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Journal entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntryType {
    /// Wallet funding
    Fund = 1,
    /// Peer-to-peer transfer
    Transfer = 2,
    /// Withdrawal
    Withdraw = 3,
}

/// Side of a money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Balance increase
    Credit = 1,
    /// Balance decrease
    Debit = 2,
}

/// Journal entry status
///
/// Every entry this engine commits is `Success`: operations are
/// synchronous and immediately terminal. `Pending` and `Failed` exist
/// for wire compatibility with the journal schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntryStatus {
    /// Awaiting settlement (never written by this engine)
    Pending = 1,
    /// Committed
    Success = 2,
    /// Failed (never written by this engine)
    Failed = 3,
}

/// Immutable record of one side of a balance-changing event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique entry ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Wallet this entry belongs to
    pub wallet_id: Uuid,

    /// Kind of movement
    pub entry_type: EntryType,

    /// Credit or debit
    pub direction: Direction,

    /// Amount moved (always positive)
    pub amount: Decimal,

    /// Terminal status
    pub status: EntryStatus,

    /// Human-readable description
    pub description: String,

    /// Entry timestamp
    pub created_at: DateTime<Utc>,
}

/// Result of a committed transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSummary {
    /// Amount moved
    pub amount: Decimal,

    /// Sender balance after the debit
    pub sender_balance: Decimal,

    /// Recipient balance after the credit
    pub recipient_balance: Decimal,
}
