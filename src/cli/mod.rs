//! CLI module
//!
//! # Commands
//!
//! - `serve` - Start the authenticated HTTP server
//! - `pull` - Pull one source and print the records
//! - `sources` - List built-in sources
//! - `validate` - Validate the configuration file

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
pub use server::{router, serve, AppState, API_KEY_HEADER};
