//! Protocol enumerations and value types.

use core::fmt;

use crate::ids::{MICROCHIP_VENDOR_ID, PLENOM_VENDOR_ID, product_ids};

/// Busylight hardware model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusylightModel {
    /// Busylight UC Alpha (light only).
    Alpha,
    /// Busylight UC Omega (light and speaker).
    Omega,
}

impl BusylightModel {
    /// Classify a USB identity, returning `None` for non-Busylight devices.
    pub fn from_ids(vid: u16, pid: u16) -> Option<Self> {
        match (vid, pid) {
            (PLENOM_VENDOR_ID, product_ids::OMEGA | product_ids::OMEGA_ALT) => Some(Self::Omega),
            (PLENOM_VENDOR_ID, product_ids::ALPHA) => Some(Self::Alpha),
            (MICROCHIP_VENDOR_ID, product_ids::ALPHA_LEGACY) => Some(Self::Alpha),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Alpha => "Busylight UC Alpha",
            Self::Omega => "Busylight UC Omega",
        }
    }
}

/// Instruction opcode, carried in the high nibble of the command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Set color / blink / ringtone parameters and continue at `target`.
    Jump = 0x1,
    /// Reserved: device reset.
    Reset = 0x2,
    /// Reserved: enter the bootloader.
    Boot = 0x4,
    /// Controller heartbeat with a timeout in the low nibble.
    KeepAlive = 0x8,
}

impl OpCode {
    pub const fn nibble(self) -> u8 {
        self as u8
    }

    /// Decode the `cmd_hi` nibble. Unassigned values return `None`.
    pub const fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x1 => Some(Self::Jump),
            0x2 => Some(Self::Reset),
            0x4 => Some(Self::Boot),
            0x8 => Some(Self::KeepAlive),
            _ => None,
        }
    }
}

/// Built-in ringtones of the Omega speaker.
///
/// The 4-bit tone code lives at bits 3..=6 of the instruction word, directly
/// below the `update` flag. Kuando documents each tone by its full settings
/// byte (`update << 7 | code << 3`), available through [`Ring::legacy_byte`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ring {
    #[default]
    Off,
    OpenOffice,
    Quiet,
    Funky,
    FairyTale,
    KuandoTrain,
    TelephoneNordic,
    TelephoneOriginal,
    TelephonePickMeUp,
    Buzz,
}

impl Ring {
    pub const ALL: [Ring; 10] = [
        Ring::Off,
        Ring::OpenOffice,
        Ring::Quiet,
        Ring::Funky,
        Ring::FairyTale,
        Ring::KuandoTrain,
        Ring::TelephoneNordic,
        Ring::TelephoneOriginal,
        Ring::TelephonePickMeUp,
        Ring::Buzz,
    ];

    /// Settings byte as documented by Kuando, with the update bit set.
    pub const fn legacy_byte(self) -> u8 {
        match self {
            Ring::Off => 0,
            Ring::OpenOffice => 136,
            Ring::Quiet => 144,
            Ring::Funky => 152,
            Ring::FairyTale => 160,
            Ring::KuandoTrain => 168,
            Ring::TelephoneNordic => 176,
            Ring::TelephoneOriginal => 184,
            Ring::TelephonePickMeUp => 192,
            Ring::Buzz => 216,
        }
    }

    /// 4-bit tone code written into the ringtone field.
    pub const fn code(self) -> u8 {
        (self.legacy_byte() >> 3) & 0x0F
    }

    /// Decode a ringtone field value. Codes without a named tone return `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|ring| ring.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Ring::Off => "off",
            Ring::OpenOffice => "open_office",
            Ring::Quiet => "quiet",
            Ring::Funky => "funky",
            Ring::FairyTale => "fairy_tale",
            Ring::KuandoTrain => "kuando_train",
            Ring::TelephoneNordic => "telephone_nordic",
            Ring::TelephoneOriginal => "telephone_original",
            Ring::TelephonePickMeUp => "telephone_pick_me_up",
            Ring::Buzz => "buzz",
        }
    }
}

/// 8-bit-per-channel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub const fn is_black(self) -> bool {
        self.red == 0 && self.green == 0 && self.blue == 0
    }

    /// Scale every channel by `brightness / 255`, truncating toward zero.
    pub const fn scaled(self, brightness: u8) -> Self {
        Self {
            red: scale_channel(self.red, brightness),
            green: scale_channel(self.green, brightness),
            blue: scale_channel(self.blue, brightness),
        }
    }
}

const fn scale_channel(channel: u8, brightness: u8) -> u8 {
    // 255 * 255 / 255 == 255, so the quotient always fits.
    ((channel as u16 * brightness as u16) / 255) as u8
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.red, self.green, self.blue)
    }
}
