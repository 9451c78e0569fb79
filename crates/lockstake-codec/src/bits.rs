//! Bit-level cursor over cell data.
//!
//! Cell payloads are bit strings, not byte strings: a release message is
//! 364 bits long. [`BitWriter`] appends big-endian fields of any width,
//! [`BitReader`] consumes them in the same order and reports which field
//! ran out of bits.
//!
//! Byte conversion uses the ledger's completion tag: after the last data
//! bit a single `1` bit is appended, then zeros up to the byte boundary.

use std::fmt;

use lockstake_types::{EscrowError, Result, constants};

/// An owned, MSB-first bit string.
///
/// Bits past `len` in the final byte are always zero, so two bit strings
/// with equal contents compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BitString {
    data: Vec<u8>,
    len: usize,
}

impl BitString {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the string fits into a single cell.
    #[must_use]
    pub fn fits_cell(&self) -> bool {
        self.len <= constants::CELL_MAX_BITS
    }

    /// Bit at `index`, MSB-first. `None` past the end.
    #[must_use]
    pub fn bit(&self, index: usize) -> Option<bool> {
        (index < self.len).then(|| self.data[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    /// Backing bytes; the unused tail of the last byte is zero.
    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.data
    }

    fn push(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            self.data[self.len / 8] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    /// Bytes with the completion tag always appended.
    ///
    /// Byte-aligned strings gain a trailing `0x80`, which makes the
    /// encoding self-delimiting without a separate length field.
    #[must_use]
    pub fn to_augmented_bytes(&self) -> Vec<u8> {
        let mut tagged = self.clone();
        tagged.push(true);
        tagged.data
    }

    /// Inverse of [`BitString::to_augmented_bytes`].
    ///
    /// # Errors
    /// Returns `MalformedField` if the buffer carries no completion tag.
    pub fn from_augmented_bytes(bytes: &[u8]) -> Result<Self> {
        Self::strip_completion_tag(bytes.to_vec(), "payload")
    }

    /// Cell data as stored inside a bag of cells: tagged only when the
    /// bit length is not a multiple of eight.
    #[must_use]
    pub fn to_cell_data(&self) -> Vec<u8> {
        if self.len % 8 == 0 {
            self.data.clone()
        } else {
            self.to_augmented_bytes()
        }
    }

    /// Inverse of [`BitString::to_cell_data`]; `aligned` comes from the
    /// cell descriptor.
    ///
    /// # Errors
    /// Returns `MalformedField` if an unaligned buffer has no completion tag.
    pub fn from_cell_data(bytes: &[u8], aligned: bool) -> Result<Self> {
        if aligned {
            return Ok(Self {
                data: bytes.to_vec(),
                len: bytes.len() * 8,
            });
        }
        Self::strip_completion_tag(bytes.to_vec(), "cell data")
    }

    fn strip_completion_tag(mut data: Vec<u8>, field: &'static str) -> Result<Self> {
        let last = *data
            .last()
            .ok_or_else(|| EscrowError::malformed(field, "empty buffer has no completion tag"))?;
        if last == 0 {
            return Err(EscrowError::malformed(
                field,
                "final byte is zero: completion tag missing",
            ));
        }
        let tag_offset = 7 - last.trailing_zeros() as usize;
        let len = (data.len() - 1) * 8 + tag_offset;
        if let Some(byte) = data.last_mut() {
            *byte &= !(0x80 >> tag_offset);
        }
        data.truncate(len.div_ceil(8));
        Ok(Self { data, len })
    }

    /// Hex of the augmented bytes, for logs and fixtures.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_augmented_bytes())
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits x{{{}}}", self.len, self.to_hex())
    }
}

/// Append-only writer of big-endian bit fields.
#[derive(Debug, Default)]
pub struct BitWriter {
    bits: BitString,
}

impl BitWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.bits.len
    }

    pub fn write_bit(&mut self, bit: bool) -> &mut Self {
        self.bits.push(bit);
        self
    }

    /// Write the low `width` bits of `value`, most significant first.
    pub fn write_uint(&mut self, value: u128, width: u32) -> &mut Self {
        debug_assert!(width <= 128, "width {width} exceeds 128 bits");
        debug_assert!(
            width == 128 || value >> width == 0,
            "value {value} does not fit in {width} bits"
        );
        for i in (0..width).rev() {
            self.bits.push((value >> i) & 1 == 1);
        }
        self
    }

    /// Write `value` as a `width`-bit two's complement integer.
    pub fn write_int(&mut self, value: i128, width: u32) -> &mut Self {
        debug_assert!((1..=128).contains(&width), "width {width} out of range");
        let mask = if width == 128 {
            u128::MAX
        } else {
            (1u128 << width) - 1
        };
        #[allow(clippy::cast_sign_loss)]
        let raw = (value as u128) & mask;
        self.write_uint(raw, width)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        for byte in bytes {
            self.write_uint(u128::from(*byte), 8);
        }
        self
    }

    pub fn write_bits(&mut self, bits: &BitString) -> &mut Self {
        for i in 0..bits.len {
            self.bits.push(bits.data[i / 8] & (0x80 >> (i % 8)) != 0);
        }
        self
    }

    #[must_use]
    pub fn finish(self) -> BitString {
        debug_assert!(self.bits.fits_cell(), "{} bits overflow a cell", self.bits.len);
        self.bits
    }
}

/// Sequential reader over a [`BitString`].
#[derive(Debug)]
pub struct BitReader<'a> {
    bits: &'a BitString,
    pos: usize,
}

impl<'a> BitReader<'a> {
    #[must_use]
    pub fn new(bits: &'a BitString) -> Self {
        Self { bits, pos: 0 }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bits.len - self.pos
    }

    fn require(&self, width: usize, field: &'static str) -> Result<()> {
        if self.remaining() < width {
            return Err(EscrowError::malformed(
                field,
                format!("need {width} bits, {} left", self.remaining()),
            ));
        }
        Ok(())
    }

    fn take(&mut self) -> bool {
        let bit = self.bits.data[self.pos / 8] & (0x80 >> (self.pos % 8)) != 0;
        self.pos += 1;
        bit
    }

    pub fn read_bit(&mut self, field: &'static str) -> Result<bool> {
        self.require(1, field)?;
        Ok(self.take())
    }

    pub fn read_uint(&mut self, width: u32, field: &'static str) -> Result<u128> {
        debug_assert!(width <= 128, "width {width} exceeds 128 bits");
        self.require(width as usize, field)?;
        let mut value = 0u128;
        for _ in 0..width {
            value = (value << 1) | u128::from(self.take());
        }
        Ok(value)
    }

    /// Read the next `width` bits without consuming them.
    pub fn peek_uint(&self, width: u32, field: &'static str) -> Result<u128> {
        let mut probe = BitReader {
            bits: self.bits,
            pos: self.pos,
        };
        probe.read_uint(width, field)
    }

    /// Read a `width`-bit two's complement integer.
    pub fn read_int(&mut self, width: u32, field: &'static str) -> Result<i128> {
        debug_assert!((1..=128).contains(&width), "width {width} out of range");
        let raw = self.read_uint(width, field)?;
        // Sign-extend: move the field's sign bit to bit 127, shift back arithmetically.
        let shift = 128 - width;
        #[allow(clippy::cast_possible_wrap)]
        let value = ((raw << shift) as i128) >> shift;
        Ok(value)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        narrow(self.read_uint(8, field)?, field)
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32> {
        narrow(self.read_uint(32, field)?, field)
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64> {
        narrow(self.read_uint(64, field)?, field)
    }

    pub fn read_bytes(&mut self, count: usize, field: &'static str) -> Result<Vec<u8>> {
        self.require(count * 8, field)?;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let mut byte = 0u8;
            for _ in 0..8 {
                byte = (byte << 1) | u8::from(self.take());
            }
            out.push(byte);
        }
        Ok(out)
    }

    /// Fail if any bits are left unread.
    pub fn ensure_consumed(&self, field: &'static str) -> Result<()> {
        if self.remaining() != 0 {
            return Err(EscrowError::malformed(
                field,
                format!("{} unexpected trailing bits", self.remaining()),
            ));
        }
        Ok(())
    }
}

fn narrow<T: TryFrom<u128>>(value: u128, field: &'static str) -> Result<T> {
    T::try_from(value).map_err(|_| EscrowError::malformed(field, format!("{value} out of range")))
}
