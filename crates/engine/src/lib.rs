//! Busylight Engine - transport, light effects and command dispatch
//!
//! This crate drives a Kuando Busylight through the frames built by
//! `busylight-hid-kuando-protocol`. A [`Dispatcher`] maps command strings to
//! single frames or to background effects run by the [`EffectScheduler`];
//! every frame goes out through one mutex-guarded [`SharedTransport`].

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod dispatcher;
pub mod effects;
pub mod error;
#[cfg(feature = "hidapi")]
pub mod hid;
pub mod palette;
pub mod prelude;
pub mod scheduler;
pub mod transport;

pub use config::{BusylightConfig, DeviceConfig, EffectTiming, KeepAliveConfig};
pub use dispatcher::{Command, Dispatcher, Outcome};
pub use effects::{Effect, EffectKind, StopSignal, fade_ramp};
pub use error::{ConfigError, DispatchError, SchedulerError, TransportError, TransportResult};
#[cfg(feature = "hidapi")]
pub use hid::{DeviceSummary, HidApiTransport, list_devices};
pub use scheduler::{EffectScheduler, EffectState, EffectStatus};
pub use transport::{HidTransport, SharedTransport, TransportStats};
