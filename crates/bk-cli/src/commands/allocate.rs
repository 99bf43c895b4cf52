//! Allocate command: bind a resource to an event, and list allocations.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use bk_core::form::AllocationForm;
use bk_core::{Allocation, AllocationError, AllocationService, Event, Resource, ValidationError};
use bk_db::Database;
use clap::Args;

use super::util::display_window;

#[derive(Debug, Args)]
pub struct AllocateArgs {
    /// Event ID (required).
    #[arg(long)]
    pub event: Option<String>,

    /// Resource ID (required).
    #[arg(long)]
    pub resource: Option<String>,
}

fn rejection_message(err: &AllocationError) -> &'static str {
    match err {
        AllocationError::Conflict { .. } => "Resource conflict detected",
        AllocationError::EventNotFound(_) => "Event not found",
        AllocationError::ResourceNotFound(_) => "Resource not found",
        AllocationError::Retryable { .. } => "Database is busy, try again",
        AllocationError::Validation(_) => "Event has an invalid time window",
        AllocationError::Store(_) => "Allocation failed",
    }
}

/// Allocates a resource to an event.
///
/// Every failure leaves the database unchanged; the request must be resubmitted.
pub fn run<W: Write>(
    writer: &mut W,
    service: &AllocationService<Database>,
    args: &AllocateArgs,
) -> Result<()> {
    let form = AllocationForm {
        event: args.event.clone(),
        resource: args.resource.clone(),
    };
    let request = form.validate().map_err(|err| {
        let message = match &err {
            ValidationError::Empty { .. } => "All fields are required",
            _ => "Event and resource must be numeric IDs",
        };
        anyhow::Error::new(err).context(message)
    })?;

    service
        .allocate(request.event_id, request.resource_id)
        .map_err(|err| {
            let message = rejection_message(&err);
            anyhow::Error::new(err).context(message)
        })?;
    writeln!(writer, "Resource allocated successfully")?;
    Ok(())
}

/// Formats allocations with their event window and resource name.
pub fn format_allocations(
    allocations: &[Allocation],
    events: &[Event],
    resources: &[Resource],
) -> String {
    let events: HashMap<_, _> = events.iter().map(|e| (e.id, e)).collect();
    let resources: HashMap<_, _> = resources.iter().map(|r| (r.id, r)).collect();

    let mut output = String::new();
    if allocations.is_empty() {
        writeln!(output, "No allocations.").unwrap();
        return output;
    }

    writeln!(output, "Allocations:").unwrap();
    for allocation in allocations {
        let resource = resources
            .get(&allocation.resource_id)
            .map_or("(unknown resource)", |r| r.name.as_str());
        match events.get(&allocation.event_id) {
            Some(event) => writeln!(
                output,
                "- {} ({}): {resource}",
                event.title,
                display_window(event.start_time, event.end_time)
            )
            .unwrap(),
            None => writeln!(output, "- event #{}: {resource}", allocation.event_id).unwrap(),
        }
    }
    output
}

/// Lists committed allocations.
pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let allocations = db.list_allocations().context("failed to list allocations")?;
    let events = db.list_events()?;
    let resources = db.list_resources()?;
    write!(
        writer,
        "{}",
        format_allocations(&allocations, &events, &resources)
    )?;
    Ok(())
}
