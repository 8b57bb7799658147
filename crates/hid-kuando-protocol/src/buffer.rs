//! 512-bit command buffer, the unit written to the device.
//!
//! The frame is eight big-endian 64-bit slots, `line0` first. The low 64 bits
//! of the frame (the storage of `line7`) double as the control trailer:
//!
//! | bits  | field       |
//! |-------|-------------|
//! | 56–63 | sensitivity |
//! | 48–55 | timeout     |
//! | 40–47 | trigger     |
//! | 16–39 | padbytes    |
//! | 0–15  | checksum    |
//!
//! A fresh buffer has every slot zero and `padbytes = 0xFFFFFF`. The checksum
//! is the 16-bit sum of the first 62 serialized bytes, big-endian, and is
//! recomputed by every [`CommandBuffer::to_bytes`] call.

use core::fmt;

use crate::instruction::Instruction;

/// Wire size of a command buffer.
pub const FRAME_LEN: usize = 64;

/// Number of instruction slots.
pub const LINE_COUNT: usize = 8;

/// Number of leading bytes covered by the checksum.
pub const CHECKSUM_COVERED_LEN: usize = FRAME_LEN - 2;

/// Trailer word of a freshly constructed buffer.
pub const DEFAULT_TRAILER: u64 = 0x00FF_FFFF_0000;

/// Field descriptors of the trailer word.
pub mod trailer {
    use crate::bitfield::BitField;

    pub const SENSITIVITY: BitField = BitField::new(56, 8);
    pub const TIMEOUT: BitField = BitField::new(48, 8);
    pub const TRIGGER: BitField = BitField::new(40, 8);
    pub const PADBYTES: BitField = BitField::new(16, 24);
    pub const CHECKSUM: BitField = BitField::new(0, 16);
}

const TRAILER_SLOT: usize = LINE_COUNT - 1;

/// A 64-byte Busylight frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandBuffer {
    /// `words[0]` is the most significant slot (`line0`).
    words: [u64; LINE_COUNT],
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBuffer {
    pub const fn new() -> Self {
        let mut words = [0u64; LINE_COUNT];
        words[TRAILER_SLOT] = DEFAULT_TRAILER;
        Self { words }
    }

    /// A fresh buffer carrying `instruction` in `line0`.
    pub const fn with_line0(instruction: Instruction) -> Self {
        let mut buffer = Self::new();
        buffer.words[0] = instruction.raw();
        buffer
    }

    /// Replace slot `slot & 7` with `instruction`.
    ///
    /// Writing `line7` overwrites the control trailer.
    pub fn with_line(mut self, slot: u8, instruction: Instruction) -> Self {
        if let Some(word) = self.words.get_mut(usize::from(slot & 0x7)) {
            *word = instruction.raw();
        }
        self
    }

    /// Instruction stored in slot `slot & 7`.
    pub fn line(&self, slot: u8) -> Instruction {
        self.words
            .get(usize::from(slot & 0x7))
            .copied()
            .map(Instruction::from_raw)
            .unwrap_or_default()
    }

    /// The frame as eight 64-bit words, most significant first.
    pub const fn as_words(&self) -> &[u64; LINE_COUNT] {
        &self.words
    }

    const fn trailer_word(&self) -> u64 {
        self.words[TRAILER_SLOT]
    }

    fn map_trailer(mut self, f: impl FnOnce(u64) -> u64) -> Self {
        if let Some(word) = self.words.last_mut() {
            *word = f(*word);
        }
        self
    }

    pub const fn sensitivity(&self) -> u8 {
        trailer::SENSITIVITY.get(self.trailer_word()) as u8
    }

    pub const fn timeout(&self) -> u8 {
        trailer::TIMEOUT.get(self.trailer_word()) as u8
    }

    pub const fn trigger(&self) -> u8 {
        trailer::TRIGGER.get(self.trailer_word()) as u8
    }

    pub const fn padbytes(&self) -> u32 {
        trailer::PADBYTES.get(self.trailer_word()) as u32
    }

    /// Checksum field of the live value. Zero until a caller stores one;
    /// serialization computes its own.
    pub const fn checksum_field(&self) -> u16 {
        trailer::CHECKSUM.get(self.trailer_word()) as u16
    }

    pub fn with_sensitivity(self, value: u64) -> Self {
        self.map_trailer(|w| trailer::SENSITIVITY.set(w, value))
    }

    pub fn with_timeout(self, value: u64) -> Self {
        self.map_trailer(|w| trailer::TIMEOUT.set(w, value))
    }

    pub fn with_trigger(self, value: u64) -> Self {
        self.map_trailer(|w| trailer::TRIGGER.set(w, value))
    }

    pub fn with_padbytes(self, value: u64) -> Self {
        self.map_trailer(|w| trailer::PADBYTES.set(w, value))
    }

    /// Serialize the frame with its checksum fixed up.
    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let mut out = [0u8; FRAME_LEN];
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.words.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        let [hi, lo] = checksum(&out).to_be_bytes();
        let [.., checksum_hi, checksum_lo] = &mut out;
        *checksum_hi = hi;
        *checksum_lo = lo;
        out
    }
}

/// 16-bit wrapping sum of every byte of `frame` except the last two.
pub fn checksum(frame: &[u8]) -> u16 {
    let covered = frame.len().saturating_sub(2);
    frame
        .iter()
        .take(covered)
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)))
}

/// Returns `true` when the trailing two bytes of `frame` hold its checksum.
pub fn verify_checksum(frame: &[u8; FRAME_LEN]) -> bool {
    let [.., hi, lo] = frame;
    u16::from_be_bytes([*hi, *lo]) == checksum(frame)
}

impl From<Instruction> for CommandBuffer {
    fn from(instruction: Instruction) -> Self {
        Self::with_line0(instruction)
    }
}

impl fmt::Display for CommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CommandBuffer(value=")?;
        for word in &self.words {
            write!(f, "{word:016x}")?;
        }
        f.write_str(")")
    }
}
