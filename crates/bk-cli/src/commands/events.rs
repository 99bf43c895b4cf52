//! Events command: list events and create new ones.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use bk_core::form::EventForm;
use bk_core::{Event, ValidationError};
use bk_db::Database;
use clap::Args;

use super::util::display_window;

#[derive(Debug, Args)]
pub struct AddEventArgs {
    /// Event title (required).
    #[arg(long)]
    pub title: Option<String>,

    /// Free-text description.
    #[arg(long)]
    pub desc: Option<String>,

    /// Start time, ISO 8601 (e.g., 2025-03-10T10:00) (required).
    #[arg(long)]
    pub start: Option<String>,

    /// End time, ISO 8601; must be after the start (required).
    #[arg(long)]
    pub end: Option<String>,
}

impl AddEventArgs {
    fn form(&self) -> EventForm {
        EventForm {
            title: self.title.clone(),
            desc: self.desc.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }
}

/// User-facing status message for a rejected event submission.
fn rejection_message(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::Empty { .. } => "All required fields must be filled",
        ValidationError::EndNotAfterStart { .. } => "End time must be after start time",
        ValidationError::InvalidTimestamp { .. } | ValidationError::InvalidId { .. } => {
            "Start and end must be ISO 8601 date-times"
        }
    }
}

/// Creates an event from submitted field values.
pub fn add<W: Write>(writer: &mut W, db: &Database, args: &AddEventArgs) -> Result<()> {
    let new_event = args.form().validate().map_err(|err| {
        let message = rejection_message(&err);
        anyhow::Error::new(err).context(message)
    })?;

    let event = db.insert_event(&new_event).context("failed to create event")?;
    writeln!(writer, "Event created successfully (#{})", event.id)?;
    Ok(())
}

/// Formats events for display.
pub fn format_events(events: &[Event]) -> String {
    let mut output = String::new();
    if events.is_empty() {
        writeln!(output, "No events.").unwrap();
        return output;
    }

    writeln!(output, "Events:").unwrap();
    for event in events {
        writeln!(
            output,
            "- #{} {} ({})",
            event.id,
            event.title,
            display_window(event.start_time, event.end_time)
        )
        .unwrap();
        if let Some(description) = &event.description {
            writeln!(output, "    {description}").unwrap();
        }
    }
    output
}

/// Lists all events.
pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let events = db.list_events()?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&events)?)?;
    } else {
        write!(writer, "{}", format_events(&events))?;
    }
    Ok(())
}
