//! Busylight daemon support library
//!
//! The `busylightd` binary is a thin shell over this crate: argument parsing
//! and logging live in `main.rs`, device opening and the command loop live
//! here so they can be exercised without hardware.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod daemon;
pub mod device;

pub use daemon::{CommandLoop, LoopSummary, StopReason, abort_startup, spawn_line_reader};
pub use device::{DeviceSelection, parse_hex_id};
