//! Transaction journal entries
//!
//! One entry per side of every money movement, append-only and immutable
//! once committed. Entries are staged into the same [`crate::store::TxnScope`]
//! as the balance mutation they document, so a mutation can never commit
//! without its entry or vice versa.
//!
//! Entry IDs are UUIDv7: the per-wallet index `wallet_id || entry_id` then
//! sorts entries in creation order.

use crate::types::{Direction, EntryStatus, EntryType, ExternalId, JournalEntry};
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

impl JournalEntry {
    fn new(
        wallet_id: Uuid,
        entry_type: EntryType,
        direction: Direction,
        amount: Decimal,
        description: String,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            wallet_id,
            entry_type,
            direction,
            amount,
            status: EntryStatus::Success,
            description,
            created_at: Utc::now(),
        }
    }

    /// Credit entry for a wallet funding
    pub fn fund_credit(wallet_id: Uuid, amount: Decimal) -> Self {
        Self::new(
            wallet_id,
            EntryType::Fund,
            Direction::Credit,
            amount,
            format!("Wallet funded with {}", amount),
        )
    }

    /// Debit entry for a withdrawal
    pub fn withdraw_debit(wallet_id: Uuid, amount: Decimal) -> Self {
        Self::new(
            wallet_id,
            EntryType::Withdraw,
            Direction::Debit,
            amount,
            format!("Withdrawal of {}", amount),
        )
    }

    /// Debit entry for the sending side of a transfer
    pub fn transfer_debit(wallet_id: Uuid, amount: Decimal, recipient: &ExternalId) -> Self {
        Self::new(
            wallet_id,
            EntryType::Transfer,
            Direction::Debit,
            amount,
            format!("Transferred {} to user {}", amount, recipient),
        )
    }

    /// Credit entry for the receiving side of a transfer
    pub fn transfer_credit(wallet_id: Uuid, amount: Decimal, sender: &ExternalId) -> Self {
        Self::new(
            wallet_id,
            EntryType::Transfer,
            Direction::Credit,
            amount,
            format!("Received {} from user {}", amount, sender),
        )
    }
}
