//! Controller configuration
//!
//! Loaded from JSON. Every field has a default, so a partial file (or no file
//! at all) yields a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use busylight_hid_kuando_protocol::MAX_KEEP_ALIVE_TIMEOUT;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;

pub const SCHEMA_VERSION: &str = "busylight.config/1";

/// Complete controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusylightConfig {
    /// Configuration schema version
    pub schema_version: String,
    /// Device selection override
    pub device: DeviceConfig,
    /// Effect cadence
    pub timing: EffectTiming,
    /// Heartbeat settings
    pub keep_alive: KeepAliveConfig,
    /// Starting rainbow stops a running fade and vice versa.
    pub exclusive_effects: bool,
}

/// Explicit VID/PID. When unset, the first known Busylight is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
}

/// Effect timing, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectTiming {
    /// Period between keep-alive frames
    pub keep_alive_interval_ms: u64,
    /// How long each rainbow color is held
    pub rainbow_hold_ms: u64,
    /// Delay between fade steps
    pub fade_step_ms: u64,
    /// Brightness increment per fade step
    pub fade_step: u8,
    /// Pause between a ringtone and the follow-up red blink
    pub ringtone_settle_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    pub enabled: bool,
    /// Seconds the device waits for the next heartbeat, 0–15.
    pub timeout: u8,
}

impl Default for BusylightConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            device: DeviceConfig::default(),
            timing: EffectTiming::default(),
            keep_alive: KeepAliveConfig::default(),
            exclusive_effects: false,
        }
    }
}

impl Default for EffectTiming {
    fn default() -> Self {
        Self {
            keep_alive_interval_ms: 7000,
            rainbow_hold_ms: 100,
            fade_step_ms: 20,
            fade_step: 5,
            ringtone_settle_ms: 500,
        }
    }
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: MAX_KEEP_ALIVE_TIMEOUT,
        }
    }
}

impl EffectTiming {
    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_millis(self.keep_alive_interval_ms)
    }

    pub fn rainbow_hold(&self) -> Duration {
        Duration::from_millis(self.rainbow_hold_ms)
    }

    pub fn fade_step_delay(&self) -> Duration {
        Duration::from_millis(self.fade_step_ms)
    }

    pub fn ringtone_settle(&self) -> Duration {
        Duration::from_millis(self.ringtone_settle_ms)
    }
}

impl BusylightConfig {
    /// Load from `path`. A missing file yields the defaults and is not created.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: BusylightConfig = serde_json::from_str(&content)?;

        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Self::default_config_path()?)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// `$HOME/.config/busylight/config.json`, or `%LOCALAPPDATA%\busylight\config.json`.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = if cfg!(windows) {
            PathBuf::from(std::env::var("LOCALAPPDATA").map_err(|_e| ConfigError::MissingEnv("LOCALAPPDATA"))?)
        } else {
            PathBuf::from(std::env::var("HOME").map_err(|_e| ConfigError::MissingEnv("HOME"))?)
                .join(".config")
        };

        Ok(config_dir.join("busylight").join("config.json"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.schema_version.starts_with("busylight.config/") {
            return Err(ConfigError::Invalid(format!(
                "Invalid schema version: {}",
                self.schema_version
            )));
        }

        if self.device.vendor_id.is_some() != self.device.product_id.is_some() {
            return Err(ConfigError::Invalid(
                "vendor_id and product_id must be set together".to_string(),
            ));
        }

        let timing = &self.timing;
        if timing.keep_alive_interval_ms == 0
            || timing.rainbow_hold_ms == 0
            || timing.fade_step_ms == 0
        {
            return Err(ConfigError::Invalid(
                "effect intervals must be non-zero".to_string(),
            ));
        }

        if timing.fade_step == 0 {
            return Err(ConfigError::Invalid("fade step must be non-zero".to_string()));
        }

        if self.keep_alive.timeout > MAX_KEEP_ALIVE_TIMEOUT {
            return Err(ConfigError::Invalid(format!(
                "Invalid keep-alive timeout: {} s (max {})",
                self.keep_alive.timeout, MAX_KEEP_ALIVE_TIMEOUT
            )));
        }

        // The device goes dark if the heartbeat arrives after its timeout.
        let timeout_ms = u64::from(self.keep_alive.timeout).saturating_mul(1000);
        if self.keep_alive.enabled && timing.keep_alive_interval_ms >= timeout_ms {
            return Err(ConfigError::Invalid(format!(
                "Keep-alive interval {} ms must be shorter than the {} s device timeout",
                timing.keep_alive_interval_ms, self.keep_alive.timeout
            )));
        }

        if !self.keep_alive.enabled {
            warn!("Keep-alive disabled: the light will switch off after its timeout");
        }

        Ok(())
    }
}
