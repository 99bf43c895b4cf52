//! Booking CLI library.
//!
//! This crate provides the CLI interface for the booking system.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, EventsAction, ResourcesAction};
pub use config::Config;
