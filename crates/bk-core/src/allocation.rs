//! Allocation of resources to events.
//!
//! # Atomicity
//!
//! The overlap check and the insert must behave as one unit, otherwise two
//! concurrent requests for the same resource can both pass the check and
//! double-book it. [`AllocationService`] serializes allocations per resource
//! with an in-process lock table, and [`Store::insert_allocation`] re-checks
//! inside its own write transaction so writers in other processes are covered
//! too. Allocations of different resources never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::conflict::ConflictChecker;
use crate::model::Allocation;
use crate::store::{Entity, Store, StoreError};
use crate::types::{EventId, ResourceId, ValidationError};

/// Reasons an allocation attempt fails. None of them leave a partial write.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("event {0} not found")]
    EventNotFound(EventId),

    #[error("resource {0} not found")]
    ResourceNotFound(ResourceId),

    /// The resource is already committed during an overlapping window.
    #[error("resource {resource_id} is already allocated during event {event_id}'s window")]
    Conflict {
        event_id: EventId,
        resource_id: ResourceId,
    },

    /// The store was held by another writer; the request can be resubmitted.
    #[error("allocation of resource {resource_id} could not complete, try again")]
    Retryable { resource_id: ResourceId },

    /// The stored event has an unusable time window.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(StoreError),
}

impl AllocationError {
    /// Returns true if resubmitting the same request may succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }

    fn from_store(err: StoreError, event_id: EventId, resource_id: ResourceId) -> Self {
        match err {
            StoreError::NotFound {
                entity: Entity::Event,
                ..
            } => Self::EventNotFound(event_id),
            StoreError::NotFound {
                entity: Entity::Resource,
                ..
            } => Self::ResourceNotFound(resource_id),
            StoreError::Conflict { .. } => Self::Conflict {
                event_id,
                resource_id,
            },
            StoreError::Busy => Self::Retryable { resource_id },
            other @ StoreError::Backend(_) => Self::Store(other),
        }
    }
}

/// One mutex per resource, created on first use.
#[derive(Debug, Default)]
struct ResourceLocks {
    locks: Mutex<HashMap<ResourceId, Arc<Mutex<()>>>>,
}

impl ResourceLocks {
    fn handle(&self, resource_id: ResourceId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(resource_id).or_default())
    }
}

/// Validates, conflict-checks, and commits allocations.
///
/// Holds no domain state of its own; every call works against the store as
/// committed at that moment. Share one service between threads to get
/// per-resource serialization.
#[derive(Debug)]
pub struct AllocationService<S> {
    store: S,
    locks: ResourceLocks,
}

impl<S: Store> AllocationService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: ResourceLocks::default(),
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Allocates `resource_id` to `event_id` for the event's time window.
    ///
    /// Checks, in order: the event exists, the resource exists, the window is
    /// free. On success exactly one allocation is recorded; on failure the
    /// store is untouched.
    pub fn allocate(
        &self,
        event_id: EventId,
        resource_id: ResourceId,
    ) -> Result<Allocation, AllocationError> {
        let event = self.store.get_event(event_id).map_err(|err| match err {
            StoreError::NotFound { .. } => AllocationError::EventNotFound(event_id),
            other => AllocationError::from_store(other, event_id, resource_id),
        })?;
        self.store.get_resource(resource_id).map_err(|err| match err {
            StoreError::NotFound { .. } => AllocationError::ResourceNotFound(resource_id),
            other => AllocationError::from_store(other, event_id, resource_id),
        })?;
        let window = event.interval()?;

        let lock = self.locks.handle(resource_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let checker = ConflictChecker::new(&self.store);
        let clash = checker
            .conflicting_event(resource_id, window)
            .map_err(|err| AllocationError::from_store(err, event_id, resource_id))?;
        if let Some(existing) = clash {
            tracing::warn!(
                %event_id,
                %resource_id,
                conflicting_event = %existing.id,
                "resource conflict detected"
            );
            return Err(AllocationError::Conflict {
                event_id,
                resource_id,
            });
        }

        let allocation = self
            .store
            .insert_allocation(event_id, resource_id)
            .map_err(|err| {
                tracing::debug!(%event_id, %resource_id, error = %err, "allocation insert rejected");
                AllocationError::from_store(err, event_id, resource_id)
            })?;
        tracing::info!(%event_id, %resource_id, "resource allocated");
        Ok(allocation)
    }
}
