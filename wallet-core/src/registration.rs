//! Registration flow: blacklist gate then wallet creation
//!
//! The directory registers the user record; this flow is the orchestrator
//! that screens the identity and provisions the wallet, keeping the
//! wallet and user components free of references to each other.

use crate::{
    error::Result,
    outcome::{Outcome, RejectReason},
    screening::BlacklistGate,
    types::{User, Wallet},
    wallet::WalletService,
};
use std::sync::Arc;

/// Gates wallet provisioning on the blacklist check
#[derive(Clone)]
pub struct RegistrationFlow {
    gate: Arc<dyn BlacklistGate>,
    wallets: WalletService,
}

impl RegistrationFlow {
    /// New flow over a gate and the wallet service
    pub fn new(gate: Arc<dyn BlacklistGate>, wallets: WalletService) -> Self {
        Self { gate, wallets }
    }

    /// Screen a freshly registered user and create their wallet.
    ///
    /// An unreachable gate propagates as [`crate::Error::Upstream`] and
    /// no wallet is created; "gate down" is never treated as "not
    /// blacklisted".
    pub async fn register(&self, user: &User) -> Result<Outcome<Wallet>> {
        if self.gate.is_blacklisted(&user.email).await? {
            tracing::warn!(user_id = %user.id, "Registration refused: blacklisted");
            return Ok(Outcome::rejected(RejectReason::Blacklisted));
        }

        self.wallets.create_wallet(user.id)
    }
}
