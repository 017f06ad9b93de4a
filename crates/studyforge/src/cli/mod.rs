//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the studyforge binary.

mod backend;
mod commands;
mod limits;
mod output;
mod providers;
mod usage;

pub use backend::open_core;
pub use commands::{Cli, Commands};
pub use limits::handle_limit_command;
pub use providers::handle_provider_command;
pub use usage::{ask, show_quota, show_usage};
