//! Packed bit-field access over a 64-bit word.
//!
//! Every field of the Busylight protocol is a contiguous run of bits inside a
//! big-endian 64-bit word. Reads shift and mask; writes clear the target range
//! and OR in the new value masked to the field width. Values that do not fit
//! are truncated, never rejected.

/// Number of bits in the word every field lives in.
pub const WORD_BITS: u32 = u64::BITS;

/// Mask covering the low `width` bits. `width == 0` yields an empty mask and
/// any width of 64 or more yields a full mask.
#[inline]
pub const fn mask(width: u32) -> u64 {
    if width == 0 {
        0
    } else if width >= WORD_BITS {
        u64::MAX
    } else {
        u64::MAX >> (WORD_BITS - width)
    }
}

/// Read `width` bits starting at bit `offset`.
///
/// Offsets past the end of the word read as zero.
#[inline]
pub const fn get(word: u64, offset: u32, width: u32) -> u64 {
    match word.checked_shr(offset) {
        Some(shifted) => shifted & mask(width),
        None => 0,
    }
}

/// Return `word` with `width` bits at `offset` replaced by `value & mask(width)`.
///
/// Bits that would land past the top of the word are dropped.
#[inline]
pub const fn set(word: u64, offset: u32, width: u32, value: u64) -> u64 {
    let field_mask = mask(width);
    let (Some(clear), Some(bits)) = (
        field_mask.checked_shl(offset),
        (value & field_mask).checked_shl(offset),
    ) else {
        return word;
    };
    (word & !clear) | bits
}

/// A named `(offset, width)` sub-range of a 64-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitField {
    offset: u32,
    width: u32,
}

impl BitField {
    /// Describe a field. Evaluated at compile time for every protocol field,
    /// so a layout that overflows the word fails the build.
    pub const fn new(offset: u32, width: u32) -> Self {
        assert!(width >= 1, "bit field must be at least one bit wide");
        assert!(offset + width <= WORD_BITS, "bit field exceeds the word");
        Self { offset, width }
    }

    pub const fn offset(self) -> u32 {
        self.offset
    }

    pub const fn width(self) -> u32 {
        self.width
    }

    /// Mask of the field, in field (unshifted) position.
    pub const fn mask(self) -> u64 {
        mask(self.width)
    }

    /// Largest value representable by the field.
    pub const fn max_value(self) -> u64 {
        self.mask()
    }

    #[inline]
    pub const fn get(self, word: u64) -> u64 {
        get(word, self.offset, self.width)
    }

    #[inline]
    pub const fn set(self, word: u64, value: u64) -> u64 {
        set(word, self.offset, self.width, value)
    }
}
