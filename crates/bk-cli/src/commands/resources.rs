//! Resources command: list resources and register new ones.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use bk_core::Resource;
use bk_core::form::ResourceForm;
use bk_db::Database;
use clap::Args;

#[derive(Debug, Args)]
pub struct AddResourceArgs {
    /// Resource name (required).
    #[arg(long)]
    pub name: Option<String>,

    /// Category, such as "room" or "equipment" (required).
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,
}

/// Registers a resource from submitted field values.
pub fn add<W: Write>(writer: &mut W, db: &Database, args: &AddResourceArgs) -> Result<()> {
    let form = ResourceForm {
        name: args.name.clone(),
        kind: args.kind.clone(),
    };
    let new_resource = form.validate().context("All fields are required")?;

    let resource = db
        .insert_resource(&new_resource)
        .context("failed to add resource")?;
    writeln!(writer, "Resource added successfully (#{})", resource.id)?;
    Ok(())
}

/// Formats resources for display.
pub fn format_resources(resources: &[Resource]) -> String {
    let mut output = String::new();
    if resources.is_empty() {
        writeln!(output, "No resources.").unwrap();
        return output;
    }

    writeln!(output, "Resources:").unwrap();
    for resource in resources {
        writeln!(output, "- #{} {} [{}]", resource.id, resource.name, resource.kind).unwrap();
    }
    output
}

/// Lists all resources.
pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let resources = db.list_resources()?;
    write!(writer, "{}", format_resources(&resources))?;
    Ok(())
}
