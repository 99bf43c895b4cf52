//! Overlap detection against committed allocations.

use crate::model::{Event, Interval};
use crate::store::{Store, StoreError};
use crate::types::ResourceId;

/// Read-only check of a candidate window against a resource's bookings.
///
/// Does not verify that the resource exists; an unknown resource simply has
/// no bookings.
pub struct ConflictChecker<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> ConflictChecker<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Returns true if any event holding `resource_id` overlaps `candidate`.
    pub fn has_conflict(
        &self,
        resource_id: ResourceId,
        candidate: Interval,
    ) -> Result<bool, StoreError> {
        Ok(self.conflicting_event(resource_id, candidate)?.is_some())
    }

    /// Returns the first event holding `resource_id` that overlaps `candidate`.
    ///
    /// Events sharing only a boundary with the candidate are not conflicts.
    pub fn conflicting_event(
        &self,
        resource_id: ResourceId,
        candidate: Interval,
    ) -> Result<Option<Event>, StoreError> {
        let held = self.store.allocations_for_resource(resource_id)?;
        Ok(held.into_iter().find(|event| {
            event
                .interval()
                .is_ok_and(|window| candidate.overlaps(&window))
        }))
    }
}
