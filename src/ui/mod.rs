//! # User Interface
//!
//! Colored stderr diagnostics. stdout is reserved for the wire
//! protocol, so nothing here may write to it.

pub mod log;

pub use log::{debug, error, info, success, warn, Log};
