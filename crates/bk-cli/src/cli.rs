//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::allocate::AllocateArgs;
use crate::commands::events::AddEventArgs;
use crate::commands::report::ReportArgs;
use crate::commands::resources::AddResourceArgs;

/// Resource booking without double-booking.
///
/// Create events, register resources, allocate resources to events, and
/// report allocated hours per resource.
#[derive(Debug, Parser)]
#[command(name = "bk", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show database location and record counts.
    Status,

    /// List or create events.
    #[command(subcommand)]
    Events(EventsAction),

    /// List or register resources.
    #[command(subcommand)]
    Resources(ResourcesAction),

    /// Allocate a resource to an event.
    Allocate(AllocateArgs),

    /// List committed allocations.
    Allocations,

    /// Report allocated hours per resource over a date range.
    Report(ReportArgs),
}

/// Event actions.
#[derive(Debug, Subcommand)]
pub enum EventsAction {
    /// List all events.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Create an event.
    Add(AddEventArgs),
}

/// Resource actions.
#[derive(Debug, Subcommand)]
pub enum ResourcesAction {
    /// List all resources.
    List,
    /// Register a resource.
    Add(AddResourceArgs),
}
