//! 64-bit Busylight instruction word.
//!
//! Layout (bit 63 is the most significant bit of byte 0 on the wire):
//!
//! | bits  | field    | meaning                                      |
//! |-------|----------|----------------------------------------------|
//! | 60–63 | cmd_hi   | [`OpCode`]                                   |
//! | 56–59 | cmd_lo   | jump target (0–7) or keep-alive timeout      |
//! | 48–55 | repeat   | repeat count for a jump                      |
//! | 40–47 | red      |                                              |
//! | 32–39 | green    |                                              |
//! | 24–31 | blue     |                                              |
//! | 16–23 | dc_on    | on time of the blink duty cycle              |
//! | 8–15  | dc_off   | off time of the blink duty cycle             |
//! | 7     | update   | apply ringtone / volume                      |
//! | 3–6   | ringtone | [`Ring::code`]                               |
//! | 0–2   | volume   | 0–7                                          |
//!
//! All writers mask the value to the field width.

use core::fmt;

use crate::types::{OpCode, Ring, Rgb};

/// Wire size of a single instruction.
pub const INSTRUCTION_LEN: usize = 8;

/// Field descriptors of the instruction word.
pub mod fields {
    use crate::bitfield::BitField;

    pub const CMD: BitField = BitField::new(56, 8);
    pub const CMD_HI: BitField = BitField::new(60, 4);
    pub const CMD_LO: BitField = BitField::new(56, 4);
    pub const REPEAT: BitField = BitField::new(48, 8);
    pub const RED: BitField = BitField::new(40, 8);
    pub const GREEN: BitField = BitField::new(32, 8);
    pub const BLUE: BitField = BitField::new(24, 8);
    pub const DC_ON: BitField = BitField::new(16, 8);
    pub const DC_OFF: BitField = BitField::new(8, 8);
    pub const UPDATE: BitField = BitField::new(7, 1);
    pub const RINGTONE: BitField = BitField::new(3, 4);
    pub const VOLUME: BitField = BitField::new(0, 3);
}

/// Mask applied to a jump target before it is stored.
pub const JUMP_TARGET_MASK: u8 = 0x07;

/// Mask applied to a keep-alive timeout before it is stored.
pub const KEEP_ALIVE_TIMEOUT_MASK: u8 = 0x0F;

/// Largest keep-alive timeout the device accepts.
pub const MAX_KEEP_ALIVE_TIMEOUT: u8 = 15;

/// Parameters of a [`Instruction::jump`].
///
/// `Default` gives a jump to line 0 with the light off, no blink, no repeat
/// and no ringtone update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JumpParams {
    /// Target line, masked to 0–7.
    pub target: u8,
    /// Steady color. `None` leaves the channels zero, which the device shows as off.
    pub color: Option<Rgb>,
    pub repeat: u8,
    /// Blink on time, in device ticks.
    pub on_time: u8,
    /// Blink off time, in device ticks.
    pub off_time: u8,
    /// Apply `ringtone` and `volume`.
    pub update: bool,
    pub ringtone: Ring,
    /// Speaker volume, masked to 0–7.
    pub volume: u8,
}

/// One encoded device instruction.
///
/// A plain value: every `with_*` method returns a new word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Instruction(u64);

macro_rules! field_accessors {
    ($($(#[$meta:meta])* $get:ident, $set:ident => $field:expr;)*) => {
        $(
            $(#[$meta])*
            #[inline]
            pub const fn $get(self) -> u8 {
                $field.get(self.0) as u8
            }

            #[inline]
            pub const fn $set(self, value: u64) -> Self {
                Self($field.set(self.0, value))
            }
        )*
    };
}

impl Instruction {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    field_accessors! {
        /// Full command byte (`cmd_hi << 4 | cmd_lo`).
        cmd, with_cmd => fields::CMD;
        cmd_hi, with_cmd_hi => fields::CMD_HI;
        cmd_lo, with_cmd_lo => fields::CMD_LO;
        repeat, with_repeat => fields::REPEAT;
        red, with_red => fields::RED;
        green, with_green => fields::GREEN;
        blue, with_blue => fields::BLUE;
        dc_on, with_dc_on => fields::DC_ON;
        dc_off, with_dc_off => fields::DC_OFF;
        update, with_update => fields::UPDATE;
        ringtone, with_ringtone => fields::RINGTONE;
        volume, with_volume => fields::VOLUME;
    }

    /// Build a jump instruction.
    pub const fn jump(params: JumpParams) -> Self {
        let mut word = Self(0)
            .with_cmd_hi(OpCode::Jump.nibble() as u64)
            .with_cmd_lo((params.target & JUMP_TARGET_MASK) as u64)
            .with_repeat(params.repeat as u64)
            .with_dc_on(params.on_time as u64)
            .with_dc_off(params.off_time as u64)
            .with_update(params.update as u64)
            .with_ringtone(params.ringtone.code() as u64)
            .with_volume(params.volume as u64);
        if let Some(color) = params.color {
            word = word.with_color(color);
        }
        word
    }

    /// Build a keep-alive instruction; `timeout` is masked to 0–15.
    pub const fn keep_alive(timeout: u8) -> Self {
        Self(0)
            .with_cmd_hi(OpCode::KeepAlive.nibble() as u64)
            .with_cmd_lo((timeout & KEEP_ALIVE_TIMEOUT_MASK) as u64)
    }

    /// Steady color on line 0.
    pub const fn solid(color: Rgb) -> Self {
        Self::jump(JumpParams {
            target: 0,
            color: Some(color),
            repeat: 0,
            on_time: 0,
            off_time: 0,
            update: false,
            ringtone: Ring::Off,
            volume: 0,
        })
    }

    /// Blink `color` with the given duty cycle.
    pub const fn blink(color: Rgb, on_time: u8, off_time: u8) -> Self {
        Self::jump(JumpParams {
            target: 0,
            color: Some(color),
            repeat: 0,
            on_time,
            off_time,
            update: false,
            ringtone: Ring::Off,
            volume: 0,
        })
    }

    /// Light off (solid black).
    pub const fn off() -> Self {
        Self::solid(Rgb::BLACK)
    }

    /// Play `ringtone` once at `volume`, light unchanged (channels zero).
    pub const fn ring(ringtone: Ring, volume: u8) -> Self {
        Self::jump(JumpParams {
            target: 0,
            color: None,
            repeat: 1,
            on_time: 0,
            off_time: 0,
            update: true,
            ringtone,
            volume,
        })
    }

    /// Silence the speaker.
    pub const fn stop_ringtone() -> Self {
        Self::jump(JumpParams {
            target: 0,
            color: None,
            repeat: 0,
            on_time: 0,
            off_time: 0,
            update: true,
            ringtone: Ring::Off,
            volume: 0,
        })
    }

    pub const fn with_color(self, color: Rgb) -> Self {
        self.with_red(color.red as u64)
            .with_green(color.green as u64)
            .with_blue(color.blue as u64)
    }

    pub const fn color(self) -> Rgb {
        Rgb::new(self.red(), self.green(), self.blue())
    }

    /// Decoded opcode, `None` for unassigned nibbles.
    pub const fn opcode(self) -> Option<OpCode> {
        OpCode::from_nibble(self.cmd_hi())
    }

    /// Decoded ringtone, `None` for codes without a named tone.
    pub fn ring_tone(self) -> Option<Ring> {
        Ring::from_code(self.ringtone())
    }

    /// Big-endian wire encoding.
    pub const fn to_bytes(self) -> [u8; INSTRUCTION_LEN] {
        self.0.to_be_bytes()
    }

    pub const fn from_bytes(bytes: [u8; INSTRUCTION_LEN]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl From<Instruction> for u64 {
    fn from(instruction: Instruction) -> Self {
        instruction.0
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instruction(value={:016x})", self.0)
    }
}
