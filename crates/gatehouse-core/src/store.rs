// crates/gatehouse-core/src/store.rs

//! Persistence seams of the decision engine: the template store holding
//! enrolled identities and the append-only access log.
//!
//! Both are constructed once by the caller and handed to the
//! [`DecisionEngine`](crate::engine::DecisionEngine); the engine never reaches
//! for an ambient connection.

use crate::errors::GatehouseError;
use crate::event::{AccessEvent, AccessStatus};
use crate::identity::EnrolledIdentity;
use crate::types::IdentityId;
use async_trait::async_trait;

pub mod in_memory_store;

/// Page size for event listings when the caller does not choose one.
pub const DEFAULT_EVENT_LIMIT: usize = 100;

pub use in_memory_store::{InMemoryAccessLog, InMemoryTemplateStore};

/// Holds enrolled identities. Read-mostly.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Registers a new identity.
    ///
    /// # Errors
    /// * [`GatehouseError::DuplicateIdentity`] if the `identity_id` is already
    ///   enrolled. The existing record is left untouched.
    /// * [`GatehouseError::StorageUnavailable`] if the store cannot be reached.
    async fn enroll(&self, identity: EnrolledIdentity) -> Result<(), GatehouseError>;

    /// Returns every enrolled identity in insertion order.
    ///
    /// The order matters: the matcher resolves ties in favour of the
    /// identity enrolled first. The returned snapshot never contains a
    /// partially written enrollment.
    async fn list_all(&self) -> Result<Vec<EnrolledIdentity>, GatehouseError>;

    /// Looks up a single identity by id.
    async fn get(&self, identity_id: &IdentityId)
        -> Result<Option<EnrolledIdentity>, GatehouseError>;

    /// Number of enrolled identities.
    async fn count(&self) -> Result<usize, GatehouseError>;
}

/// Append-only record of access decisions.
#[async_trait]
pub trait AccessLogger: Send + Sync {
    /// Appends exactly one event stamped with the current time and returns it.
    ///
    /// Concurrent appends are serialized; no row is ever updated or removed.
    async fn record(
        &self,
        identity_id: Option<IdentityId>,
        status: AccessStatus,
        reason: &str,
    ) -> Result<AccessEvent, GatehouseError>;

    /// The newest `limit` events, newest first.
    async fn list_events(&self, limit: usize) -> Result<Vec<AccessEvent>, GatehouseError>;

    /// Events recorded against one identity, newest first.
    async fn events_for(&self, identity_id: &IdentityId)
        -> Result<Vec<AccessEvent>, GatehouseError>;
}
