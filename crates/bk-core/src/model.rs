//! Events, resources, and the allocations that bind them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::{EventId, ResourceId, ValidationError};

/// A half-open time range `[start, end)`.
///
/// Adjacent intervals share a boundary without overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Interval {
    /// Creates an interval, rejecting empty or inverted ranges.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EndNotAfterStart { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Returns true if the two ranges share any instant.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Length in whole hours, truncated.
    pub fn whole_hours(&self) -> i64 {
        (self.end - self.start).num_hours()
    }
}

/// A stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

impl Event {
    /// The time window this event occupies.
    pub fn interval(&self) -> Result<Interval, ValidationError> {
        Interval::new(self.start_time, self.end_time)
    }
}

/// A validated event, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    title: String,
    description: Option<String>,
    interval: Interval,
}

impl NewEvent {
    /// Validates an event submission.
    ///
    /// Titles are trimmed and must be non-empty; a blank description counts
    /// as no description.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let interval = Interval::new(start, end)?;
        Ok(Self {
            title,
            description,
            interval,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub const fn interval(&self) -> Interval {
        self.interval
    }
}

/// A stored bookable resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    /// Free-text category such as "room" or "equipment".
    #[serde(rename = "type")]
    pub kind: String,
}

/// A validated resource, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    name: String,
    kind: String,
}

impl NewResource {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        let kind = kind.into().trim().to_string();
        if kind.is_empty() {
            return Err(ValidationError::Empty { field: "type" });
        }
        Ok(Self { name, kind })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// The binding of one resource to one event for that event's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Allocation {
    pub event_id: EventId,
    pub resource_id: ResourceId,
}

/// One row of the hours-per-resource report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHours {
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub hours: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn interval(start: (u32, u32), end: (u32, u32)) -> Interval {
        Interval::new(at(start.0, start.1), at(end.0, end.1)).unwrap()
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let morning = interval((10, 0), (11, 0));
        let next = interval((11, 0), (12, 0));
        assert!(!morning.overlaps(&next));
        assert!(!next.overlaps(&morning));
    }

    #[test]
    fn partial_and_nested_intervals_overlap() {
        let base = interval((10, 0), (11, 0));
        assert!(base.overlaps(&interval((10, 30), (11, 30))));
        assert!(base.overlaps(&interval((9, 0), (10, 1))));
        assert!(base.overlaps(&interval((10, 15), (10, 45))));
        assert!(base.overlaps(&interval((9, 0), (12, 0))));
        assert!(base.overlaps(&base));
    }

    #[test]
    fn interval_rejects_empty_and_inverted_ranges() {
        assert_eq!(
            Interval::new(at(10, 0), at(10, 0)),
            Err(ValidationError::EndNotAfterStart {
                start: at(10, 0),
                end: at(10, 0),
            })
        );
        assert!(Interval::new(at(11, 0), at(10, 0)).is_err());
    }

    #[test]
    fn whole_hours_truncates() {
        assert_eq!(interval((10, 0), (11, 59)).whole_hours(), 1);
        assert_eq!(interval((10, 0), (10, 59)).whole_hours(), 0);
        assert_eq!(interval((9, 0), (12, 0)).whole_hours(), 3);
    }

    #[test]
    fn new_event_trims_and_validates() {
        let event = NewEvent::new("  Standup ", Some("   ".to_string()), at(9, 0), at(9, 15)).unwrap();
        assert_eq!(event.title(), "Standup");
        assert_eq!(event.description(), None);

        assert_eq!(
            NewEvent::new(" ", None, at(9, 0), at(10, 0)),
            Err(ValidationError::Empty { field: "title" })
        );
        assert!(NewEvent::new("Late", None, at(10, 0), at(9, 0)).is_err());
    }

    #[test]
    fn new_resource_requires_name_and_type() {
        assert!(NewResource::new("Projector", "equipment").is_ok());
        assert_eq!(
            NewResource::new("", "equipment"),
            Err(ValidationError::Empty { field: "name" })
        );
        assert_eq!(
            NewResource::new("Projector", " "),
            Err(ValidationError::Empty { field: "type" })
        );
    }

    #[test]
    fn resource_serializes_kind_as_type() {
        let resource = Resource {
            id: ResourceId::new(1),
            name: "Room A".to_string(),
            kind: "room".to_string(),
        };
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["type"], "room");
        assert_eq!(json["id"], 1);
    }
}
