// crates/gatehouse-core/src/store/in_memory_store.rs

use crate::errors::GatehouseError;
use crate::event::{AccessEvent, AccessStatus};
use crate::identity::EnrolledIdentity;
use crate::store::{AccessLogger, TemplateStore};
use crate::types::IdentityId;
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use std::sync::{Arc, Mutex, RwLock};

/// An in-memory implementation of the `TemplateStore` trait.
///
/// Identities live in a `Vec` behind an `RwLock`, which keeps insertion order
/// and makes each enrollment atomic with respect to readers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateStore {
    identities: Arc<RwLock<Vec<EnrolledIdentity>>>,
}

impl InMemoryTemplateStore {
    /// Creates a new, empty `InMemoryTemplateStore`.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn enroll(&self, identity: EnrolledIdentity) -> Result<(), GatehouseError> {
        let mut identities = self.identities.write()?;
        if identities
            .iter()
            .any(|existing| existing.identity_id == identity.identity_id)
        {
            return Err(GatehouseError::DuplicateIdentity(identity.identity_id));
        }
        identities.push(identity);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<EnrolledIdentity>, GatehouseError> {
        Ok(self.identities.read()?.clone())
    }

    async fn get(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Option<EnrolledIdentity>, GatehouseError> {
        Ok(self
            .identities
            .read()?
            .iter()
            .find(|identity| &identity.identity_id == identity_id)
            .cloned())
    }

    async fn count(&self) -> Result<usize, GatehouseError> {
        Ok(self.identities.read()?.len())
    }
}

/// An in-memory implementation of the `AccessLogger` trait.
///
/// Appends take a mutex, so concurrent writers never interleave or lose rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccessLog {
    events: Arc<Mutex<Vec<AccessEvent>>>,
}

impl InMemoryAccessLog {
    /// Creates a new, empty `InMemoryAccessLog`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events appended so far.
    pub fn len(&self) -> Result<usize, GatehouseError> {
        Ok(self.events.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, GatehouseError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl AccessLogger for InMemoryAccessLog {
    async fn record(
        &self,
        identity_id: Option<IdentityId>,
        status: AccessStatus,
        reason: &str,
    ) -> Result<AccessEvent, GatehouseError> {
        let mut events = self.events.lock()?;
        let event = AccessEvent {
            event_id: events.len() as i64 + 1,
            identity_id,
            timestamp: Utc::now().trunc_subsecs(6),
            status,
            reason: reason.to_string(),
        };
        events.push(event.clone());
        Ok(event)
    }

    async fn list_events(&self, limit: usize) -> Result<Vec<AccessEvent>, GatehouseError> {
        Ok(self
            .events
            .lock()?
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn events_for(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Vec<AccessEvent>, GatehouseError> {
        Ok(self
            .events
            .lock()?
            .iter()
            .rev()
            .filter(|event| event.identity_id.as_ref() == Some(identity_id))
            .cloned()
            .collect())
    }
}
