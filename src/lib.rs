//! HDD Toggle: switch a USB-relay powered hard drive on and off while keeping the
//! operating system's view of the disk consistent.

pub mod app;
pub mod config;
pub mod daemon;
pub mod error;
pub mod hardware;
pub mod power;
pub mod system;

pub use error::{ExitStatus, ToggleError};
