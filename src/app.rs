//! Command-line surface: argument parsing, command handlers and logging setup.

pub mod cli;
pub mod commands;
pub mod logging;
