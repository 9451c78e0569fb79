//! The [`CellCodec`] trait: a type with a fixed single-cell layout.

use lockstake_types::Result;

use crate::bits::{BitReader, BitString, BitWriter};

/// A value that serializes to, and parses from, the bits of one cell.
///
/// `load` may leave bits unread so layouts can be nested;
/// [`CellCodec::from_cell`] is the strict top-level entry point.
pub trait CellCodec: Sized {
    fn store(&self, w: &mut BitWriter);

    fn load(r: &mut BitReader<'_>) -> Result<Self>;

    #[must_use]
    fn to_cell(&self) -> BitString {
        let mut w = BitWriter::new();
        self.store(&mut w);
        w.finish()
    }

    /// Parse a whole cell, rejecting trailing bits.
    fn from_cell(bits: &BitString) -> Result<Self> {
        let mut r = BitReader::new(bits);
        let value = Self::load(&mut r)?;
        r.ensure_consumed("payload")?;
        Ok(value)
    }
}
