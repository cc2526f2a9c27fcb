//! Process execution, tool lookup and output parsing.

pub mod executor;
pub mod locator;
pub mod parser;

pub use executor::{CommandRunner, ShellCommand, SystemRunner, WindowMode};
pub use locator::ToolLocator;
