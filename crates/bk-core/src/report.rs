//! Allocated hours per resource over a date range.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::model::ResourceHours;
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum ReportError {
    /// The range starts after it ends.
    #[error("invalid report range: {start} is after {end}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Sums committed allocation time per resource.
pub struct ReportAggregator<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> ReportAggregator<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Whole hours per resource for events starting in `[range_start, range_end]`.
    ///
    /// Each event contributes its length truncated to whole hours. Resources
    /// with nothing allocated in range do not appear; an empty range of
    /// bookings yields an empty vector, not an error.
    pub fn aggregate(
        &self,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Result<Vec<ResourceHours>, ReportError> {
        if range_start > range_end {
            return Err(ReportError::InvalidRange {
                start: range_start,
                end: range_end,
            });
        }
        let rows = self
            .store
            .aggregate_hours_by_resource(range_start, range_end)?;
        tracing::debug!(resources = rows.len(), %range_start, %range_end, "aggregated hours");
        Ok(rows)
    }
}

/// Sum of hours across report rows.
pub fn total_hours(rows: &[ResourceHours]) -> i64 {
    rows.iter().map(|row| row.hours).sum()
}
