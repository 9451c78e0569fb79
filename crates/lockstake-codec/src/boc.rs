//! Single-cell bag-of-cells framing.
//!
//! ```text
//!   b5ee9c72                        magic
//!   flags:u8                        has_idx:1 has_crc32c:1 has_cache_bits:1 flags:2 size_bytes:3
//!   off_bytes:u8
//!   cells, roots, absent            size_bytes each
//!   tot_cells_size                  off_bytes
//!   root_list                       size_bytes per root
//!   index                           off_bytes per cell, only when has_idx
//!   cell: d1 d2 data
//!   crc32c:u32 LE                   only when has_crc32c
//! ```
//!
//! The writer always emits `size_bytes = 1`, no index and a CRC32-C
//! trailer. The reader accepts an index and a missing checksum, but only
//! a single ordinary cell with no references.

use lockstake_types::{EscrowError, Result};

use crate::bits::BitString;

const MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];

const FLAG_HAS_IDX: u8 = 0x80;
const FLAG_HAS_CRC32C: u8 = 0x40;
const SIZE_BYTES_MASK: u8 = 0x07;

const D1_REFS_MASK: u8 = 0x07;
const D1_EXOTIC: u8 = 0x08;
const D1_WITH_HASHES: u8 = 0x10;
const D1_LEVEL_SHIFT: u8 = 5;

/// Reflected Castagnoli polynomial.
const CRC32C_POLY: u32 = 0x82F6_3B78;

/// CRC-32C (Castagnoli), as used by the bag-of-cells trailer.
#[must_use]
pub fn crc32c(bytes: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in bytes {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ CRC32C_POLY
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

fn min_bytes(value: usize) -> usize {
    let mut n = 1;
    while n < 8 && (value >> (n * 8)) != 0 {
        n += 1;
    }
    n
}

/// Wrap one cell's bits into a bag of cells with a CRC32-C trailer.
#[must_use]
pub fn serialize(bits: &BitString) -> Vec<u8> {
    let data = bits.to_cell_data();
    let d2 = bits.len() / 8 + bits.len().div_ceil(8);
    let cell_size = 2 + data.len();
    let off_bytes = min_bytes(cell_size);

    let mut out = Vec::with_capacity(16 + cell_size);
    out.extend_from_slice(&MAGIC);
    out.push(FLAG_HAS_CRC32C | 1);
    #[allow(clippy::cast_possible_truncation)]
    out.push(off_bytes as u8);
    // cells, roots, absent
    out.extend_from_slice(&[1, 1, 0]);
    out.extend_from_slice(&cell_size.to_be_bytes()[usize::BITS as usize / 8 - off_bytes..]);
    // root index
    out.push(0);
    out.push(0);
    #[allow(clippy::cast_possible_truncation)]
    out.push(d2 as u8);
    out.extend_from_slice(&data);
    let crc = crc32c(&out);
    out.extend_from_slice(&crc.to_le_bytes());
    out
}

/// Parse a single-cell bag of cells back into the cell's bits.
///
/// # Errors
/// Returns `InvalidBoc` for a bad magic, unsupported layout (several
/// cells, references, exotic or hashed cells), checksum mismatch,
/// truncation or trailing bytes.
pub fn deserialize(bytes: &[u8]) -> Result<BitString> {
    let mut cur = ByteCursor::new(bytes);
    if cur.take(4, "magic")? != MAGIC {
        return Err(invalid("unknown magic"));
    }
    let flags = cur.uint(1, "flags")?;
    #[allow(clippy::cast_possible_truncation)]
    let flags = flags as u8;
    let has_idx = flags & FLAG_HAS_IDX != 0;
    let has_crc = flags & FLAG_HAS_CRC32C != 0;
    let size_bytes = usize::from(flags & SIZE_BYTES_MASK);
    if !(1..=4).contains(&size_bytes) {
        return Err(invalid(format!("size_bytes {size_bytes} unsupported")));
    }
    let off_bytes = usize::try_from(cur.uint(1, "off_bytes")?).map_err(|_| invalid("off_bytes"))?;
    if !(1..=8).contains(&off_bytes) {
        return Err(invalid(format!("off_bytes {off_bytes} unsupported")));
    }

    let cells = cur.uint(size_bytes, "cells")?;
    let roots = cur.uint(size_bytes, "roots")?;
    let absent = cur.uint(size_bytes, "absent")?;
    if (cells, roots, absent) != (1, 1, 0) {
        return Err(invalid(format!(
            "expected one root cell, got cells={cells} roots={roots} absent={absent}"
        )));
    }
    let tot_cells_size = cur.uint(off_bytes, "tot_cells_size")?;
    if cur.uint(size_bytes, "root_list")? != 0 {
        return Err(invalid("root index out of range"));
    }
    if has_idx {
        cur.take(off_bytes, "index")?;
    }

    let cells_start = cur.pos;
    let d1 = cur.take(1, "d1")?[0];
    let d2 = cur.take(1, "d2")?[0];
    if d1 & D1_REFS_MASK != 0 {
        return Err(invalid("cell references are not supported"));
    }
    if d1 & D1_EXOTIC != 0 {
        return Err(invalid("exotic cells are not supported"));
    }
    if d1 & D1_WITH_HASHES != 0 || d1 >> D1_LEVEL_SHIFT != 0 {
        return Err(invalid("cells with stored hashes or levels are not supported"));
    }
    let data_len = usize::from(d2).div_ceil(2);
    let aligned = d2 % 2 == 0;
    let data = cur.take(data_len, "cell data")?;
    if u64::try_from(cur.pos - cells_start).ok() != Some(tot_cells_size) {
        return Err(invalid(format!(
            "tot_cells_size {tot_cells_size} does not match the cell"
        )));
    }

    if has_crc {
        let body_end = cur.pos;
        let stored = cur.take(4, "crc32c")?;
        let stored = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
        let computed = crc32c(&bytes[..body_end]);
        if stored != computed {
            return Err(invalid(format!(
                "checksum mismatch: stored {stored:08x}, computed {computed:08x}"
            )));
        }
    }
    if cur.pos != bytes.len() {
        return Err(invalid(format!(
            "{} trailing bytes",
            bytes.len() - cur.pos
        )));
    }

    let bits = BitString::from_cell_data(data, aligned)
        .map_err(|e| invalid(format!("cell data: {e}")))?;
    if !bits.fits_cell() {
        return Err(invalid(format!("{} bits exceed one cell", bits.len())));
    }
    Ok(bits)
}

fn invalid(reason: impl Into<String>) -> EscrowError {
    EscrowError::InvalidBoc {
        reason: reason.into(),
    }
}

struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| invalid(format!("truncated at {what}")))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn uint(&mut self, n: usize, what: &str) -> Result<u64> {
        Ok(self
            .take(n, what)?
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitWriter;

    #[test]
    fn crc32c_check_value() {
        assert_eq!(crc32c(b"123456789"), 0xE306_9283);
        assert_eq!(crc32c(b""), 0);
    }

    #[test]
    fn empty_cell_matches_reference() {
        let boc = serialize(&BitString::new());
        assert_eq!(hex::encode(&boc), "b5ee9c724101010100020000004cacb9cd");
        assert!(deserialize(&boc).unwrap().is_empty());
    }

    #[test]
    fn header_layout() {
        let mut w = BitWriter::new();
        w.write_uint(0b1011, 4);
        let boc = serialize(&w.finish());
        // flags, off_bytes, cells, roots, absent, tot_cells_size, root
        assert_eq!(&boc[4..11], &[0x41, 0x01, 0x01, 0x01, 0x00, 0x03, 0x00]);
        // d1 = 0, d2 = 0 + 1 (one unaligned byte), data 1011_1000
        assert_eq!(&boc[11..14], &[0x00, 0x01, 0xb8]);
        assert_eq!(boc.len(), 18);
    }

    #[test]
    fn roundtrip_aligned_and_unaligned() {
        for bits in [96usize, 364, 1023] {
            let mut w = BitWriter::new();
            for i in 0..bits {
                w.write_bit(i % 3 == 0);
            }
            let cell = w.finish();
            assert_eq!(deserialize(&serialize(&cell)).unwrap(), cell);
        }
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let mut boc = serialize(&BitString::new());
        let last = boc.len() - 1;
        boc[last] ^= 0x01;
        let err = deserialize(&boc).unwrap_err();
        assert!(format!("{err}").contains("checksum"));
        assert_eq!(err.exit_code(), Some(9));
    }

    #[test]
    fn accepts_missing_crc_and_index() {
        // has_idx, no crc, size_bytes = 1; index entry = 2
        let boc = hex::decode("81010101000200020000").unwrap();
        let mut framed = MAGIC.to_vec();
        framed.extend_from_slice(&boc);
        assert!(deserialize(&framed).unwrap().is_empty());
    }

    #[test]
    fn rejects_unsupported_layouts() {
        let cases = [
            // bad magic
            "b5ee9c734101010100020000004cacb9cd",
            // two cells
            "b5ee9c72010102010004000000000000",
            // cell with a reference
            "b5ee9c7201010101000200010000",
            // exotic cell
            "b5ee9c7201010101000200080000",
            // trailing byte
            "b5ee9c720101010100020000000000",
            // truncated
            "b5ee9c72410101",
        ];
        for case in cases {
            let bytes = hex::decode(case).unwrap();
            assert!(
                matches!(deserialize(&bytes), Err(EscrowError::InvalidBoc { .. })),
                "accepted {case}"
            );
        }
    }
}
