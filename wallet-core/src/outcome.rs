//! Tagged outcome type for business results
//!
//! Expected business conditions (insufficient balance, missing wallet,
//! same-account transfer) are data, not errors: callers branch on the
//! variant exhaustively. The error channel in [`crate::error`] is
//! reserved for infrastructure failures.

use serde::{Deserialize, Serialize};

/// Why an operation was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Amount was zero or negative
    InvalidAmount,
    /// Sender and recipient are the same identity
    SameAccount,
    /// User missing from the directory
    UserNotFound,
    /// User has no wallet
    WalletNotFound,
    /// Sender or recipient missing from the directory
    PartiesNotFound,
    /// Sender or recipient wallet missing
    WalletsNotFound,
    /// User already holds a wallet
    WalletExists,
    /// Withdrawal exceeds the balance
    InsufficientBalance,
    /// Transfer exceeds the sender balance
    InsufficientFunds,
    /// Identity barred from registration
    Blacklisted,
}

impl RejectReason {
    /// Default caller-facing message
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::InvalidAmount => "Amount must be positive",
            RejectReason::SameAccount => "Cannot transfer to same account",
            RejectReason::UserNotFound => "User not found",
            RejectReason::WalletNotFound => "Wallet not found",
            RejectReason::PartiesNotFound => "Sender or recipient not found",
            RejectReason::WalletsNotFound => "Wallet(s) not found",
            RejectReason::WalletExists => "Wallet already exists for this user",
            RejectReason::InsufficientBalance => "Insufficient balance",
            RejectReason::InsufficientFunds => "Insufficient funds",
            RejectReason::Blacklisted => "Identity is blacklisted",
        }
    }
}

/// Outcome of a public ledger operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// Operation committed; carries the result payload
    Completed {
        /// Payload (new balance, wallet, transfer summary)
        data: T,
    },
    /// Business-rule rejection; nothing was committed
    Rejected {
        /// Machine-readable reason
        reason: RejectReason,
        /// Caller-facing message
        message: String,
    },
}

impl<T> Outcome<T> {
    /// Successful outcome
    pub fn completed(data: T) -> Self {
        Outcome::Completed { data }
    }

    /// Rejection with the reason's default message
    pub fn rejected(reason: RejectReason) -> Self {
        Outcome::Rejected {
            reason,
            message: reason.message().to_string(),
        }
    }

    /// True if the operation committed
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }

    /// Payload, if committed
    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Completed { data } => Some(data),
            Outcome::Rejected { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_rejection_carries_message() {
        let outcome: Outcome<Decimal> = Outcome::rejected(RejectReason::InsufficientBalance);
        assert!(!outcome.is_completed());
        match outcome {
            Outcome::Rejected { reason, message } => {
                assert_eq!(reason, RejectReason::InsufficientBalance);
                assert_eq!(message, "Insufficient balance");
            }
            Outcome::Completed { .. } => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_wire_shape() {
        let outcome = Outcome::completed(Decimal::new(100000, 2));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["data"], "1000.00");

        let outcome: Outcome<Decimal> = Outcome::rejected(RejectReason::SameAccount);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["message"], "Cannot transfer to same account");
    }

    #[test]
    fn test_data_accessor() {
        let outcome = Outcome::completed(7u32);
        assert_eq!(outcome.data(), Some(&7));

        let outcome: Outcome<u32> = Outcome::rejected(RejectReason::WalletExists);
        assert_eq!(outcome.data(), None);
    }
}
