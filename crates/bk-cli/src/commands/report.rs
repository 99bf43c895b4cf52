//! Report command for allocated hours per resource.
//!
//! This module implements `bk report --start <DATE> --end <DATE>` with
//! human-readable and JSON output.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use bk_core::form::{ReportForm, ReportRequest};
use bk_core::types::format_timestamp;
use bk_core::{ReportAggregator, ReportError, ResourceHours, ValidationError, total_hours};
use bk_db::Database;
use clap::Args;
use serde::Serialize;

use super::util::display_time;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// First day of the range, YYYY-MM-DD or ISO 8601 date-time (required).
    #[arg(long)]
    pub start: Option<String>,

    /// Last instant of the range, inclusive; a plain date means its midnight (required).
    #[arg(long)]
    pub end: Option<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub start: String,
    pub end: String,
    pub resources: &'a [ResourceHours],
    pub total_hours: i64,
}

/// Formats the human-readable report output.
pub fn format_report(request: &ReportRequest, rows: &[ResourceHours]) -> String {
    let mut output = String::new();
    writeln!(
        output,
        "Allocated hours: {} to {}",
        display_time(request.start),
        display_time(request.end)
    )
    .unwrap();
    writeln!(output).unwrap();

    if rows.is_empty() {
        writeln!(output, "No allocations in range.").unwrap();
        return output;
    }

    let width = rows
        .iter()
        .map(|row| row.resource_name.chars().count())
        .max()
        .unwrap_or(0);
    for row in rows {
        writeln!(output, "{:<width$}  {}h", row.resource_name, row.hours).unwrap();
    }
    writeln!(output).unwrap();
    writeln!(output, "Total: {}h", total_hours(rows)).unwrap();
    output
}

/// Formats report rows as JSON.
pub fn format_report_json(request: &ReportRequest, rows: &[ResourceHours]) -> Result<String> {
    let report = JsonReport {
        start: format_timestamp(request.start),
        end: format_timestamp(request.end),
        resources: rows,
        total_hours: total_hours(rows),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, db: &Database, args: &ReportArgs) -> Result<()> {
    let form = ReportForm {
        start: args.start.clone(),
        end: args.end.clone(),
    };
    let request = form.validate().map_err(|err| {
        let message = match &err {
            ValidationError::Empty { .. } => "Start and end dates are required",
            _ => "Dates must be YYYY-MM-DD or ISO 8601 date-times",
        };
        anyhow::Error::new(err).context(message)
    })?;

    let rows = ReportAggregator::new(db)
        .aggregate(request.start, request.end)
        .map_err(|err| {
            let message = match &err {
                ReportError::InvalidRange { .. } => "Invalid report range",
                ReportError::Store(_) => "Report failed",
            };
            anyhow::Error::new(err).context(message)
        })?;

    if args.json {
        writeln!(writer, "{}", format_report_json(&request, &rows)?)?;
    } else {
        write!(writer, "{}", format_report(&request, &rows))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bk_core::{AllocationService, NewEvent, NewResource};
    use chrono::{NaiveDate, NaiveDateTime};
    use insta::assert_snapshot;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn seeded_service() -> AllocationService<Database> {
        let service = AllocationService::new(Database::open_in_memory().unwrap());
        let db = service.store();
        let projector = db
            .insert_resource(&NewResource::new("Projector", "equipment").unwrap())
            .unwrap();
        let room = db
            .insert_resource(&NewResource::new("Room A", "room").unwrap())
            .unwrap();
        db.insert_resource(&NewResource::new("Room B", "room").unwrap())
            .unwrap();

        let bookings = [
            ("Standup", at(10, 8, 0), at(10, 10, 0), projector.id),
            ("Workshop", at(10, 13, 0), at(10, 16, 0), projector.id),
            ("Interviews", at(10, 9, 0), at(10, 10, 30), room.id),
            ("Offsite", at(12, 9, 0), at(12, 17, 0), room.id),
        ];
        for (title, start, end, resource_id) in bookings {
            let event = db
                .insert_event(&NewEvent::new(title, None, start, end).unwrap())
                .unwrap();
            service.allocate(event.id, resource_id).unwrap();
        }
        service
    }

    fn report_args(start: &str, end: &str, json: bool) -> ReportArgs {
        ReportArgs {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            json,
        }
    }

    #[test]
    fn report_sums_hours_per_resource() {
        let service = seeded_service();
        let mut output = Vec::new();
        run(
            &mut output,
            service.store(),
            &report_args("2025-03-10", "2025-03-11", false),
        )
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Allocated hours: 2025-03-10 00:00 to 2025-03-11 00:00

        Projector  5h
        Room A     1h

        Total: 6h
        ");
    }

    #[test]
    fn report_json_includes_total() {
        let service = seeded_service();
        let mut output = Vec::new();
        run(
            &mut output,
            service.store(),
            &report_args("2025-03-01", "2025-03-31", true),
        )
        .unwrap();

        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["start"], "2025-03-01T00:00:00");
        assert_eq!(json["total_hours"], 14);
        assert_eq!(json["resources"][0]["resource_name"], "Projector");
        assert_eq!(json["resources"][0]["hours"], 5);
        assert_eq!(json["resources"][1]["hours"], 9);
        assert_eq!(json["resources"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn report_with_no_allocations_in_range() {
        let service = seeded_service();
        let mut output = Vec::new();
        run(
            &mut output,
            service.store(),
            &report_args("2025-04-01", "2025-04-30", false),
        )
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Allocated hours: 2025-04-01 00:00 to 2025-04-30 00:00

        No allocations in range.
        ");
    }

    #[test]
    fn report_rejects_inverted_range() {
        let service = seeded_service();
        let mut output = Vec::new();
        let err = run(
            &mut output,
            service.store(),
            &report_args("2025-03-11", "2025-03-10", false),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid report range");
        assert!(output.is_empty());
    }

    #[test]
    fn report_rejects_missing_and_malformed_dates() {
        let service = seeded_service();
        let mut output = Vec::new();

        let err = run(
            &mut output,
            service.store(),
            &ReportArgs {
                start: None,
                end: Some("2025-03-10".to_string()),
                json: false,
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Start and end dates are required");

        let err = run(
            &mut output,
            service.store(),
            &report_args("March 10", "2025-03-11", false),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Dates must be YYYY-MM-DD or ISO 8601 date-times"
        );
    }
}
