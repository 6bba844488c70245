//! In-memory pending verification storage.

use async_trait::async_trait;
use dashmap::DashMap;

use meridian_core::auth::types::PendingVerification;
use meridian_core::store::{PendingStore, StoreError};
use meridian_shared::types::PendingVerificationId;

/// Pending verification storage.
///
/// Expiry is enforced by the authenticator on read; records left behind by
/// abandoned logins are inert.
#[derive(Debug, Default)]
pub struct MemoryPendingStore {
    records: DashMap<PendingVerificationId, PendingVerification>,
}

impl MemoryPendingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingStore for MemoryPendingStore {
    async fn put(&self, pending: PendingVerification) -> Result<(), StoreError> {
        self.records.insert(pending.id, pending);
        Ok(())
    }

    async fn get(
        &self,
        id: PendingVerificationId,
    ) -> Result<Option<PendingVerification>, StoreError> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn remove(&self, id: PendingVerificationId) -> Result<(), StoreError> {
        self.records.remove(&id);
        Ok(())
    }
}
