//! Intake of raw submitted field values.
//!
//! Every form is parsed into a typed request before any domain logic runs.
//! Missing and blank fields are treated alike.

use chrono::NaiveDateTime;

use crate::model::{NewEvent, NewResource};
use crate::types::{
    EventId, ResourceId, ValidationError, parse_date_or_timestamp, parse_timestamp,
};

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::Empty { field }),
    }
}

/// Fields of the add-event form.
#[derive(Debug, Clone, Default)]
pub struct EventForm {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl EventForm {
    /// Checks presence of all required fields first, then formats, then order.
    pub fn validate(&self) -> Result<NewEvent, ValidationError> {
        let title = required("title", self.title.as_deref())?;
        let start = required("start", self.start.as_deref())?;
        let end = required("end", self.end.as_deref())?;

        let start = parse_timestamp("start", start)?;
        let end = parse_timestamp("end", end)?;
        NewEvent::new(title, self.desc.clone(), start, end)
    }
}

/// Fields of the add-resource form.
#[derive(Debug, Clone, Default)]
pub struct ResourceForm {
    pub name: Option<String>,
    pub kind: Option<String>,
}

impl ResourceForm {
    pub fn validate(&self) -> Result<NewResource, ValidationError> {
        let name = required("name", self.name.as_deref())?;
        let kind = required("type", self.kind.as_deref())?;
        NewResource::new(name, kind)
    }
}

/// Fields of the allocate form.
#[derive(Debug, Clone, Default)]
pub struct AllocationForm {
    pub event: Option<String>,
    pub resource: Option<String>,
}

/// A parsed allocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRequest {
    pub event_id: EventId,
    pub resource_id: ResourceId,
}

impl AllocationForm {
    pub fn validate(&self) -> Result<AllocationRequest, ValidationError> {
        let event_id = required("event", self.event.as_deref())?.parse()?;
        let resource_id = required("resource", self.resource.as_deref())?.parse()?;
        Ok(AllocationRequest {
            event_id,
            resource_id,
        })
    }
}

/// Fields of the report form: dates or timestamps.
#[derive(Debug, Clone, Default)]
pub struct ReportForm {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Parsed report bounds. Ordering is checked by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ReportForm {
    pub fn validate(&self) -> Result<ReportRequest, ValidationError> {
        let start = required("start", self.start.as_deref())?;
        let end = required("end", self.end.as_deref())?;
        Ok(ReportRequest {
            start: parse_date_or_timestamp("start", start)?,
            end: parse_date_or_timestamp("end", end)?,
        })
    }
}
