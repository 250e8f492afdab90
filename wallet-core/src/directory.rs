//! User directory collaborator
//!
//! The directory owns user records; the ledger only resolves external
//! identities through this narrow read-only interface. Keeping the
//! interface one-way breaks the wallet/user dependency cycle: the
//! registration flow orchestrates both sides from outside.

use crate::{
    error::Result,
    types::{ExternalId, User},
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Read-only view of the external user directory.
///
/// Implementations surface transport failures as [`crate::Error::Upstream`];
/// a missing user is `Ok(None)`, never an error.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve an external identity to a user record
    async fn user_by_external_id(&self, external_id: &ExternalId) -> Result<Option<User>>;
}

/// In-memory directory for tests and local runs
#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<ExternalId, User>>,
}

impl InMemoryDirectory {
    /// Empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user record
    pub fn insert(&self, user: User) {
        self.users.write().insert(user.external_id.clone(), user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn user_by_external_id(&self, external_id: &ExternalId) -> Result<Option<User>> {
        Ok(self.users.read().get(external_id).cloned())
    }
}
