//! Error types for the Busylight engine.

use thiserror::Error;

use crate::effects::EffectKind;

/// Failure writing a frame to the device.
///
/// A failed send is reported and dropped; nothing retries it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Device disconnected")]
    Disconnected,

    #[error("HID write failed: {0}")]
    WriteFailed(String),

    #[error("Short HID write: expected {expected} bytes, wrote {actual}")]
    ShortWrite { expected: usize, actual: usize },

    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    #[error("No Busylight device found")]
    DeviceNotFound,
}

/// Failure managing an effect worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Failed to spawn {effect} worker: {reason}")]
    SpawnFailed { effect: EffectKind, reason: String },

    #[error("{0} worker panicked")]
    WorkerPanicked(EffectKind),
}

/// Failure handling an inbound command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Malformed command '{input}': {reason}")]
    MalformedCommand { input: String, reason: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Failure loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Cannot locate config directory: {0} is not set")]
    MissingEnv(&'static str),
}

pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TransportError::ShortWrite {
            expected: 64,
            actual: 12,
        };
        assert_eq!(err.to_string(), "Short HID write: expected 64 bytes, wrote 12");

        let err = DispatchError::MalformedCommand {
            input: "raw_color 1,2".to_string(),
            reason: "expected three channels".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed command 'raw_color 1,2': expected three channels"
        );

        let err = SchedulerError::WorkerPanicked(EffectKind::Rainbow);
        assert_eq!(err.to_string(), "rainbow worker panicked");
    }

    #[test]
    fn test_transport_error_passes_through_dispatch() {
        let err: DispatchError = TransportError::Disconnected.into();
        assert_eq!(err.to_string(), "Device disconnected");
    }
}
