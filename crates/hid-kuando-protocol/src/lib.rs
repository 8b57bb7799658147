//! Kuando Busylight HID protocol: bit-field codec, instructions and command buffers.
//!
//! This crate is intentionally I/O-free and allocation-free. It provides pure
//! functions and value types that can be tested without hardware or any
//! OS-level HID plumbing; writing frames to a device is the engine's job.
//!
//! # Protocol overview
//!
//! The device accepts one 64-byte output report, the [`CommandBuffer`]. It
//! holds eight 64-bit [`Instruction`] slots that the device firmware executes
//! as a tiny program, followed by a control trailer and a 16-bit checksum.
//! Only `line0` is used for everyday control: a single `Jump` that sets the
//! color, blink duty cycle and ringtone, or a `KeepAlive` that keeps the
//! device from timing out and going dark.
//!
//! The protocol is write-only. Nothing is ever read back.
//!
//! # VID / PID
//! - Plenom (Kuando): `0x27BB` — Omega `0x3BCF` / `0x3BCD`, Alpha `0x3BCA`
//! - Microchip: `0x04D8` — first-generation Alpha `0xF848`

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod bitfield;
pub mod buffer;
pub mod ids;
pub mod instruction;
pub mod types;

pub use bitfield::BitField;
pub use buffer::{
    CHECKSUM_COVERED_LEN, CommandBuffer, DEFAULT_TRAILER, FRAME_LEN, LINE_COUNT, checksum,
    verify_checksum,
};
pub use ids::{
    DEFAULT_PRODUCT_ID, DEFAULT_VENDOR_ID, KNOWN_DEVICES, MICROCHIP_VENDOR_ID, PLENOM_VENDOR_ID,
    is_busylight, product_ids, product_name,
};
pub use instruction::{INSTRUCTION_LEN, Instruction, JumpParams, MAX_KEEP_ALIVE_TIMEOUT};
pub use types::{BusylightModel, OpCode, Rgb, Ring};
