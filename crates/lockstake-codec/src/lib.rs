//! # lockstake-codec
//!
//! Bit-exact translation between escrow values and the ledger's cell
//! format.
//!
//! ## Layers
//!
//! - [`bits`]: MSB-first bit strings, writer and reader, completion tags
//! - [`fields`]: variable-width coins and account addresses
//! - [`message`]: the opcode-prefixed message catalog
//! - [`lock_data`]: the getter layout of a [`lockstake_types::LockRecord`]
//! - [`boc`]: single-cell bag-of-cells framing with a CRC32-C trailer
//!
//! Every decode error names the field that ran short or held an
//! impossible value.

pub mod bits;
pub mod boc;
pub mod cell;
pub mod fields;
pub mod lock_data;
pub mod message;

pub use bits::{BitReader, BitString, BitWriter};
pub use cell::CellCodec;
pub use message::*;
