//! Device selection and opening.

use anyhow::{Context, Result, bail};
use busylight_engine::{DeviceConfig, HidApiTransport};
use hidapi::HidApi;

/// Which device `run` and `send` open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSelection {
    /// The first attached device with a known Busylight VID/PID.
    FirstKnown,
    Explicit { vendor_id: u16, product_id: u16 },
}

impl DeviceSelection {
    /// Command-line ids win over the config file.
    pub fn resolve(vid: Option<u16>, pid: Option<u16>, config: &DeviceConfig) -> Result<Self> {
        match (vid, pid) {
            (Some(vendor_id), Some(product_id)) => Ok(Self::Explicit {
                vendor_id,
                product_id,
            }),
            (None, None) => Ok(match (config.vendor_id, config.product_id) {
                (Some(vendor_id), Some(product_id)) => Self::Explicit {
                    vendor_id,
                    product_id,
                },
                _ => Self::FirstKnown,
            }),
            _ => bail!("--vid and --pid must be given together"),
        }
    }

    pub fn open(self, api: &HidApi) -> Result<HidApiTransport> {
        match self {
            Self::FirstKnown => {
                HidApiTransport::open_first_known(api).context("no Busylight found")
            }
            Self::Explicit {
                vendor_id,
                product_id,
            } => HidApiTransport::open(api, vendor_id, product_id)
                .with_context(|| format!("failed to open device {vendor_id:04X}:{product_id:04X}")),
        }
    }
}

/// Parse a VID/PID in hex, with or without a `0x` prefix.
pub fn parse_hex_id(raw: &str) -> Result<u16> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    u16::from_str_radix(digits, 16)
        .with_context(|| format!("invalid ID value '{raw}', expected hex (0x27BB)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_id() -> Result<()> {
        assert_eq!(parse_hex_id("0x27BB")?, 0x27BB);
        assert_eq!(parse_hex_id("0X3bcf")?, 0x3BCF);
        assert_eq!(parse_hex_id(" f848 ")?, 0xF848);
        assert!(parse_hex_id("0x1FFFF").is_err());
        assert!(parse_hex_id("busylight").is_err());
        Ok(())
    }

    #[test]
    fn test_cli_ids_override_config() -> Result<()> {
        let config = DeviceConfig {
            vendor_id: Some(0x04D8),
            product_id: Some(0xF848),
        };
        assert_eq!(
            DeviceSelection::resolve(Some(0x27BB), Some(0x3BCA), &config)?,
            DeviceSelection::Explicit {
                vendor_id: 0x27BB,
                product_id: 0x3BCA
            }
        );
        assert_eq!(
            DeviceSelection::resolve(None, None, &config)?,
            DeviceSelection::Explicit {
                vendor_id: 0x04D8,
                product_id: 0xF848
            }
        );
        assert_eq!(
            DeviceSelection::resolve(None, None, &DeviceConfig::default())?,
            DeviceSelection::FirstKnown
        );
        Ok(())
    }

    #[test]
    fn test_half_specified_ids_are_rejected() {
        assert!(DeviceSelection::resolve(Some(0x27BB), None, &DeviceConfig::default()).is_err());
        assert!(DeviceSelection::resolve(None, Some(0x3BCF), &DeviceConfig::default()).is_err());
    }
}
