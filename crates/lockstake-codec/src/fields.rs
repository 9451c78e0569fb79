//! Variable-width field encodings shared by several layouts.
//!
//! - **Coins** (`VarUInteger 16`): 4-bit byte length `L`, then `8·L` bits
//!   of big-endian magnitude. The writer always picks the minimal `L`.
//! - **Address** (`MsgAddressInt`):
//!   - `10 | anycast:0 | workchain:int8 | hash:bits256` (267 bits)
//!   - `11 | anycast:0 | addr_len:uint9=256 | workchain:int32 | hash:bits256` (300 bits)
//!
//! The compact form is used whenever the workchain fits in eight bits.

use lockstake_types::{Address, Coins, EscrowError, Result};

use crate::bits::{BitReader, BitWriter};

const COINS_LEN_BITS: u32 = 4;

const ADDR_TAG_EXTERN: u128 = 0b01;
const ADDR_TAG_STD: u128 = 0b10;
const ADDR_TAG_VAR: u128 = 0b11;
const ADDR_VAR_LEN_BITS: u32 = 9;
const HASH_BITS: u128 = 256;

/// Encoded size of an address, in bits.
#[must_use]
pub fn address_bit_len(address: &Address) -> usize {
    if address.is_std() { 267 } else { 300 }
}

/// Encoded size of an amount, in bits.
#[must_use]
pub fn coins_bit_len(amount: Coins) -> usize {
    COINS_LEN_BITS as usize + amount.byte_len() as usize * 8
}

pub fn write_coins(w: &mut BitWriter, amount: Coins) {
    let len = amount.byte_len();
    w.write_uint(u128::from(len), COINS_LEN_BITS);
    w.write_uint(amount.nanos(), len * 8);
}

/// Accepts non-minimal lengths; every 15-byte magnitude is in range, so
/// the bound check only guards against a corrupted reader.
pub fn read_coins(r: &mut BitReader<'_>, field: &'static str) -> Result<Coins> {
    let len = r.read_uint(COINS_LEN_BITS, field)?;
    #[allow(clippy::cast_possible_truncation)]
    let magnitude = r.read_uint(len as u32 * 8, field)?;
    Coins::new(magnitude).map_err(|_| EscrowError::malformed(field, "coins overflow"))
}

pub fn write_address(w: &mut BitWriter, address: &Address) {
    if address.is_std() {
        w.write_uint(ADDR_TAG_STD, 2)
            .write_bit(false)
            .write_int(i128::from(address.workchain), 8);
    } else {
        w.write_uint(ADDR_TAG_VAR, 2)
            .write_bit(false)
            .write_uint(HASH_BITS, ADDR_VAR_LEN_BITS)
            .write_int(i128::from(address.workchain), 32);
    }
    w.write_bytes(&address.hash);
}

pub fn read_address(r: &mut BitReader<'_>, field: &'static str) -> Result<Address> {
    let workchain = match r.read_uint(2, field)? {
        ADDR_TAG_STD => {
            reject_anycast(r, field)?;
            r.read_int(8, field)?
        }
        ADDR_TAG_VAR => {
            reject_anycast(r, field)?;
            let len = r.read_uint(ADDR_VAR_LEN_BITS, field)?;
            if len != HASH_BITS {
                return Err(EscrowError::malformed(
                    field,
                    format!("variable address of {len} bits, expected 256"),
                ));
            }
            r.read_int(32, field)?
        }
        ADDR_TAG_EXTERN => {
            return Err(EscrowError::malformed(field, "external address not allowed"));
        }
        _ => {
            return Err(EscrowError::malformed(
                field,
                "empty address where an account is required",
            ));
        }
    };
    let workchain = i32::try_from(workchain)
        .map_err(|_| EscrowError::malformed(field, "workchain out of range"))?;

    let bytes = r.read_bytes(32, field)?;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Ok(Address { workchain, hash })
}

fn reject_anycast(r: &mut BitReader<'_>, field: &'static str) -> Result<()> {
    if r.read_bit(field)? {
        return Err(EscrowError::malformed(field, "anycast addresses are not supported"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitString;

    fn coins_bits(amount: Coins) -> BitString {
        let mut w = BitWriter::new();
        write_coins(&mut w, amount);
        w.finish()
    }

    #[test]
    fn zero_coins_is_four_bits() {
        let bits = coins_bits(Coins::ZERO);
        assert_eq!(bits.len(), 4);
        assert_eq!(bits.raw_bytes(), &[0x00]);
    }

    #[test]
    fn one_ton_layout() {
        // 1 TON = 1_000_000_000 = 0x3B9ACA00, four bytes.
        let bits = coins_bits(Coins::from_nanos(1_000_000_000));
        assert_eq!(bits.len(), 4 + 32);
        assert_eq!(bits.to_hex(), "43b9aca008");
        assert_eq!(bits.len(), coins_bit_len(Coins::from_nanos(1_000_000_000)));
    }

    #[test]
    fn coins_max_roundtrip() {
        let bits = coins_bits(Coins::MAX);
        assert_eq!(bits.len(), 4 + 120);
        let mut r = BitReader::new(&bits);
        assert_eq!(read_coins(&mut r, "amount").unwrap(), Coins::MAX);
    }

    #[test]
    fn non_minimal_coins_accepted() {
        // Length 3 carrying the value 5.
        let mut w = BitWriter::new();
        w.write_uint(3, 4).write_uint(5, 24);
        let bits = w.finish();
        let mut r = BitReader::new(&bits);
        assert_eq!(read_coins(&mut r, "amount").unwrap(), Coins::from_nanos(5));
    }

    #[test]
    fn truncated_coins_rejected() {
        let mut w = BitWriter::new();
        w.write_uint(4, 4).write_uint(1, 8);
        let bits = w.finish();
        let mut r = BitReader::new(&bits);
        assert!(matches!(
            read_coins(&mut r, "amount").unwrap_err(),
            EscrowError::MalformedField { field: "amount", .. }
        ));
    }

    #[test]
    fn std_address_layout() {
        let addr = Address::new(-1, [0xAA; 32]);
        let mut w = BitWriter::new();
        write_address(&mut w, &addr);
        let bits = w.finish();
        assert_eq!(bits.len(), 267);
        assert_eq!(bits.len(), address_bit_len(&addr));
        // 10 0 11111111 then the hash: first byte 1001_1111.
        assert_eq!(bits.raw_bytes()[0], 0b1001_1111);
        let mut r = BitReader::new(&bits);
        assert_eq!(read_address(&mut r, "user").unwrap(), addr);
    }

    #[test]
    fn var_address_for_wide_workchain() {
        let addr = Address::new(-300, [0x01; 32]);
        let mut w = BitWriter::new();
        write_address(&mut w, &addr);
        let bits = w.finish();
        assert_eq!(bits.len(), 300);
        let mut r = BitReader::new(&bits);
        assert_eq!(read_address(&mut r, "user").unwrap(), addr);
    }

    #[test]
    fn address_none_and_extern_rejected() {
        // addr_none$00 and addr_extern$01.
        for tag in [0b00, ADDR_TAG_EXTERN] {
            let mut w = BitWriter::new();
            w.write_uint(tag, 2).write_uint(0, 9);
            let bits = w.finish();
            let mut r = BitReader::new(&bits);
            assert!(read_address(&mut r, "user").is_err());
        }
    }

    #[test]
    fn anycast_rejected() {
        let mut w = BitWriter::new();
        w.write_uint(ADDR_TAG_STD, 2).write_bit(true);
        let bits = w.finish();
        let mut r = BitReader::new(&bits);
        let err = read_address(&mut r, "user").unwrap_err();
        assert!(format!("{err}").contains("anycast"));
    }

    #[test]
    fn var_address_with_short_hash_rejected() {
        let mut w = BitWriter::new();
        w.write_uint(ADDR_TAG_VAR, 2)
            .write_bit(false)
            .write_uint(128, 9)
            .write_int(5, 32)
            .write_bytes(&[0; 16]);
        let bits = w.finish();
        let mut r = BitReader::new(&bits);
        assert!(read_address(&mut r, "cashback").is_err());
    }
}
