//! Core domain logic for resource booking.
//!
//! This crate contains the fundamental types and logic for:
//! - Conflict detection: half-open overlap checks against committed allocations
//! - Allocation: the check-then-commit flow, serialized per resource
//! - Reporting: whole hours allocated per resource over a range
//! - Form intake: turning raw field values into validated requests
//!
//! Persistence is abstracted behind [`Store`]; `bk-db` provides the SQLite
//! implementation.

mod allocation;
mod conflict;
pub mod form;
mod model;
mod report;
mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use allocation::{AllocationError, AllocationService};
pub use conflict::ConflictChecker;
pub use model::{Allocation, Event, Interval, NewEvent, NewResource, Resource, ResourceHours};
pub use report::{ReportAggregator, ReportError, total_hours};
pub use store::{Entity, Store, StoreError};
pub use types::{EventId, ResourceId, ValidationError};
