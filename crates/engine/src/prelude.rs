//! Prelude module for common engine types
//!
//! This module provides a convenient way to import the types a front end
//! needs to drive a Busylight.

// Dispatch
pub use crate::dispatcher::{Command, Dispatcher, Outcome};

// Effects
pub use crate::effects::{Effect, EffectKind};
pub use crate::scheduler::{EffectScheduler, EffectState};

// Transport
pub use crate::transport::{HidTransport, SharedTransport};

#[cfg(feature = "hidapi")]
pub use crate::hid::HidApiTransport;

// Configuration and errors
pub use crate::config::{BusylightConfig, EffectTiming};
pub use crate::error::{ConfigError, DispatchError, SchedulerError, TransportError};

// Protocol values
pub use busylight_hid_kuando_protocol::{CommandBuffer, Instruction, Rgb, Ring};
