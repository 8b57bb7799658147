//! Kuando Busylight USB vendor and product ID constants.
//!
//! Kuando (Plenom A/S) ships two generations of the Busylight. Current
//! Alpha and Omega units enumerate under the Plenom VID `0x27BB`. Early
//! Alpha units were built on a Microchip reference design and still
//! enumerate under Microchip's VID `0x04D8`.
//!
//! Both generations speak the same 64-byte command-buffer protocol; the
//! difference is only in the USB identity.

#![deny(static_mut_refs)]

/// Plenom A/S (Kuando) USB Vendor ID.
pub const PLENOM_VENDOR_ID: u16 = 0x27BB;

/// Microchip Technology USB Vendor ID, used by first-generation Alpha units.
pub const MICROCHIP_VENDOR_ID: u16 = 0x04D8;

/// Known Busylight product IDs.
pub mod product_ids {
    /// Busylight UC Omega.
    pub const OMEGA: u16 = 0x3BCF;
    /// Busylight UC Omega, alternate firmware identity.
    pub const OMEGA_ALT: u16 = 0x3BCD;
    /// Busylight UC Alpha (Plenom VID).
    pub const ALPHA: u16 = 0x3BCA;
    /// Busylight UC Alpha, Microchip-based first generation.
    pub const ALPHA_LEGACY: u16 = 0xF848;
}

/// Vendor ID opened when no explicit device is configured.
pub const DEFAULT_VENDOR_ID: u16 = PLENOM_VENDOR_ID;

/// Product ID opened when no explicit device is configured.
pub const DEFAULT_PRODUCT_ID: u16 = product_ids::OMEGA;

/// Every known `(vid, pid)` pair, in the order devices are probed.
pub const KNOWN_DEVICES: [(u16, u16); 4] = [
    (PLENOM_VENDOR_ID, product_ids::OMEGA),
    (PLENOM_VENDOR_ID, product_ids::OMEGA_ALT),
    (PLENOM_VENDOR_ID, product_ids::ALPHA),
    (MICROCHIP_VENDOR_ID, product_ids::ALPHA_LEGACY),
];

/// Returns `true` when `(vid, pid)` identifies a known Busylight.
pub fn is_busylight(vid: u16, pid: u16) -> bool {
    KNOWN_DEVICES.contains(&(vid, pid))
}

/// Human-readable product name for a known `(vid, pid)` pair.
pub fn product_name(vid: u16, pid: u16) -> Option<&'static str> {
    crate::types::BusylightModel::from_ids(vid, pid).map(crate::types::BusylightModel::name)
}
