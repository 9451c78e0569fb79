//! Read-only queries over the escrow state.
//!
//! Nothing here mutates; every function borrows the state immutably.

use chrono::{DateTime, Utc};
use lockstake_codec::{BitReader, BitString, CellCodec, fields};
use lockstake_types::{Address, Coins, LockRecord, LockStatus, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::machine::EscrowState;
use crate::payout::{Payout, compute_payout};

/// The stored record for `user`, if any.
#[must_use]
pub fn get_lock(state: &EscrowState, user: &Address) -> Option<LockRecord> {
    state.store().get(user).copied()
}

/// [`get_lock`] keyed by the raw `"<workchain>:<hex>"` form.
///
/// # Errors
/// Returns `InvalidAddress` only when `raw` does not parse; an unknown
/// participant is `Ok(None)`.
pub fn get_lock_raw(state: &EscrowState, raw: &str) -> Result<Option<LockRecord>> {
    let user: Address = raw.parse()?;
    Ok(get_lock(state, &user))
}

/// Getter over the wire: the argument is an encoded address and the
/// result is the record in its cell layout.
///
/// # Errors
/// Returns `MalformedField` if `address` is not exactly one encoded
/// account address.
pub fn get_lock_encoded(state: &EscrowState, address: &BitString) -> Result<Option<BitString>> {
    let mut r = BitReader::new(address);
    let user = fields::read_address(&mut r, "address")?;
    r.ensure_consumed("address")?;
    Ok(get_lock(state, &user).map(|record| record.to_cell()))
}

/// Display-oriented summary of one participant's lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockView {
    pub user: Address,
    pub status: LockStatus,
    pub locked_amount: Coins,
    /// `locked_amount` in whole TON.
    pub locked_ton: Option<Decimal>,
    pub goal_days: u32,
    pub bonus_percent: u8,
    pub locked_at: Option<DateTime<Utc>>,
    pub unlock_at: Option<DateTime<Utc>>,
    /// Zero once the goal window has passed.
    pub seconds_remaining: u64,
    /// Share of the goal window elapsed, capped at 100, two decimals.
    pub progress_percent: Decimal,
    /// What a release at `now` would pay; `None` once released.
    pub projected_payout: Option<Payout>,
}

/// Summarize `user`'s lock as of `now`.
///
/// The projection assumes the administrator's verdict agrees with the
/// elapsed time, so it is exact under the default policy.
#[must_use]
pub fn lock_view(state: &EscrowState, user: &Address, now: u32) -> Option<LockView> {
    let record = state.store().get(user)?;
    let elapsed = record.elapsed(now);
    let goal_seconds = record.goal_seconds();

    let progress = if goal_seconds == 0 {
        Decimal::ONE_HUNDRED
    } else {
        (Decimal::from(elapsed) * Decimal::ONE_HUNDRED / Decimal::from(goal_seconds))
            .min(Decimal::ONE_HUNDRED)
            .round_dp(2)
    };

    let projected_payout = if record.released {
        None
    } else {
        compute_payout(record, now, record.goal_reached(now), &state.config().payout).ok()
    };

    Some(LockView {
        user: record.user,
        status: record.status(),
        locked_amount: record.locked_amount,
        locked_ton: record.locked_amount.to_ton(),
        goal_days: record.goal_days,
        bonus_percent: record.bonus_percent,
        locked_at: record.locked_at(),
        unlock_at: record.unlock_at(),
        seconds_remaining: goal_seconds.saturating_sub(elapsed),
        progress_percent: progress,
        projected_payout,
    })
}
