//! CLI subcommand implementations.

pub mod allocate;
pub mod events;
pub mod report;
pub mod resources;
pub mod status;
pub mod util;
