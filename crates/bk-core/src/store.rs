//! Persistence contract for events, resources, and allocations.

use std::error::Error;
use std::fmt;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::model::{Allocation, Event, NewEvent, NewResource, Resource, ResourceHours};
use crate::types::{EventId, ResourceId};

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Event,
    Resource,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => write!(f, "event"),
            Self::Resource => write!(f, "resource"),
        }
    }
}

/// Errors reported by a [`Store`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    /// The resource is already allocated during an overlapping window.
    #[error("resource {resource_id} is already allocated during event {event_id}'s window")]
    Conflict {
        event_id: EventId,
        resource_id: ResourceId,
    },

    /// Another writer holds the store; the attempt was abandoned without waiting.
    #[error("store is busy")]
    Busy,

    /// Any other failure of the underlying storage.
    #[error("storage backend failure")]
    Backend(#[source] Box<dyn Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a backend-specific error.
    pub fn backend(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }
}

/// Persistence for the booking domain.
///
/// Implementations must make [`Store::insert_allocation`] atomic: the overlap
/// check against committed allocations of the same resource and the insert
/// happen in one unit, so two overlapping allocations can never both commit.
pub trait Store {
    /// Persists a validated event and returns it with its assigned ID.
    fn insert_event(&self, event: &NewEvent) -> Result<Event, StoreError>;

    /// Persists a validated resource and returns it with its assigned ID.
    fn insert_resource(&self, resource: &NewResource) -> Result<Resource, StoreError>;

    /// Looks up an event, failing with [`StoreError::NotFound`].
    fn get_event(&self, id: EventId) -> Result<Event, StoreError>;

    /// Looks up a resource, failing with [`StoreError::NotFound`].
    fn get_resource(&self, id: ResourceId) -> Result<Resource, StoreError>;

    /// All events ordered by ID.
    fn list_events(&self) -> Result<Vec<Event>, StoreError>;

    /// All resources ordered by ID.
    fn list_resources(&self) -> Result<Vec<Resource>, StoreError>;

    /// All allocations ordered by event then resource.
    fn list_allocations(&self) -> Result<Vec<Allocation>, StoreError>;

    /// The events currently holding `resource_id`, ordered by start time.
    fn allocations_for_resource(&self, resource_id: ResourceId) -> Result<Vec<Event>, StoreError>;

    /// Atomically checks for overlap and records the allocation.
    ///
    /// Fails with [`StoreError::Conflict`] if an overlapping allocation of the
    /// same resource is already committed, [`StoreError::NotFound`] if either
    /// record is missing, and [`StoreError::Busy`] if another writer holds
    /// the store.
    fn insert_allocation(
        &self,
        event_id: EventId,
        resource_id: ResourceId,
    ) -> Result<Allocation, StoreError>;

    /// Whole hours allocated per resource, for events starting within
    /// `[range_start, range_end]`.
    ///
    /// Hours are truncated per event before summing. Resources without a
    /// matching allocation are omitted. Rows are ordered by resource ID.
    fn aggregate_hours_by_resource(
        &self,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Result<Vec<ResourceHours>, StoreError>;
}
