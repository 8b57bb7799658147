//! Real device access through `hidapi`.

use busylight_hid_kuando_protocol::{KNOWN_DEVICES, product_name};
use hidapi::{HidApi, HidDevice};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{TransportError, TransportResult};
use crate::transport::HidTransport;

/// An attached HID device as seen during enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub vendor_id: u16,
    pub product_id: u16,
    pub product: Option<String>,
    pub manufacturer: Option<String>,
    pub path: String,
    /// Model name when the ids belong to a Busylight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busylight: Option<&'static str>,
}

/// Enumerate every HID interface the OS reports.
pub fn list_devices(api: &HidApi) -> Vec<DeviceSummary> {
    let mut devices: Vec<DeviceSummary> = api
        .device_list()
        .map(|d| DeviceSummary {
            vendor_id: d.vendor_id(),
            product_id: d.product_id(),
            product: d.product_string().map(str::to_string),
            manufacturer: d.manufacturer_string().map(str::to_string),
            path: d.path().to_string_lossy().to_string(),
            busylight: product_name(d.vendor_id(), d.product_id()),
        })
        .collect();
    devices.sort_by_key(|d| (d.busylight.is_none(), d.vendor_id, d.product_id));
    devices
}

/// A Busylight opened through the OS HID stack.
pub struct HidApiTransport {
    /// `None` once closed.
    device: Option<HidDevice>,
    vendor_id: u16,
    product_id: u16,
}

impl std::fmt::Debug for HidApiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidApiTransport")
            .field("vendor_id", &format_args!("{:04X}", self.vendor_id))
            .field("product_id", &format_args!("{:04X}", self.product_id))
            .field("open", &self.device.is_some())
            .finish_non_exhaustive()
    }
}

impl HidApiTransport {
    /// Open a specific VID/PID.
    pub fn open(api: &HidApi, vendor_id: u16, product_id: u16) -> TransportResult<Self> {
        let device = api.open(vendor_id, product_id).map_err(|e| {
            TransportError::OpenFailed(format!("{vendor_id:04X}:{product_id:04X}: {e}"))
        })?;
        info!(
            "Opened {} ({vendor_id:04X}:{product_id:04X})",
            product_name(vendor_id, product_id).unwrap_or("HID device")
        );
        Ok(Self {
            device: Some(device),
            vendor_id,
            product_id,
        })
    }

    /// Open the first attached device whose ids appear in [`KNOWN_DEVICES`].
    pub fn open_first_known(api: &HidApi) -> TransportResult<Self> {
        let found = KNOWN_DEVICES.iter().copied().find(|&(vid, pid)| {
            api.device_list()
                .any(|d| d.vendor_id() == vid && d.product_id() == pid)
        });
        let Some((vid, pid)) = found else {
            debug!("No known Busylight ids among {} HID interfaces", api.device_list().count());
            return Err(TransportError::DeviceNotFound);
        };
        Self::open(api, vid, pid)
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }
}

impl HidTransport for HidApiTransport {
    fn write_report(&mut self, data: &[u8]) -> TransportResult<usize> {
        let device = self.device.as_ref().ok_or(TransportError::Disconnected)?;
        device
            .write(data)
            .map_err(|e| TransportError::WriteFailed(e.to_string()))
    }

    fn description(&self) -> String {
        format!(
            "{} ({:04X}:{:04X})",
            product_name(self.vendor_id, self.product_id).unwrap_or("HID device"),
            self.vendor_id,
            self.product_id
        )
    }

    fn close(&mut self) -> TransportResult<()> {
        if self.device.take().is_some() {
            debug!("Closed {:04X}:{:04X}", self.vendor_id, self.product_id);
        }
        Ok(())
    }
}
