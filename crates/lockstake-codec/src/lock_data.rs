//! Getter layout of a stored lock record.
//!
//! ```text
//!   user:address locked_amount:coins lock_time:u32 goal_days:u32 bonus_percent:u8 released:bit
//! ```

use lockstake_types::{LockRecord, Result};

use crate::bits::{BitReader, BitWriter};
use crate::cell::CellCodec;
use crate::fields::{read_address, read_coins, write_address, write_coins};

impl CellCodec for LockRecord {
    fn store(&self, w: &mut BitWriter) {
        write_address(w, &self.user);
        write_coins(w, self.locked_amount);
        w.write_uint(u128::from(self.lock_time), 32)
            .write_uint(u128::from(self.goal_days), 32)
            .write_uint(u128::from(self.bonus_percent), 8)
            .write_bit(self.released);
    }

    fn load(r: &mut BitReader<'_>) -> Result<Self> {
        Ok(Self {
            user: read_address(r, "user")?,
            locked_amount: read_coins(r, "locked_amount")?,
            lock_time: r.read_u32("lock_time")?,
            goal_days: r.read_u32("goal_days")?,
            bonus_percent: r.read_u8("bonus_percent")?,
            released: r.read_bit("released")?,
        })
    }
}
