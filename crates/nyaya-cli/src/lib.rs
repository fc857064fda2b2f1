//! Nyaya CLI library.
//!
//! This library provides the core functionality for the `nyaya` command-line
//! interface: argument parsing, settings, runtime assembly, command execution
//! and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use context::Context;
pub use error::{CliError, Result};
pub use output::Formatter;
