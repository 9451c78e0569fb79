//! System-wide constants for the LockStake escrow.

/// Seconds in one goal day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Upper bound (inclusive) for `bonus_percent`.
pub const MAX_BONUS_PERCENT: u8 = 100;

/// Divisor for percentage arithmetic.
pub const PERCENT_DENOMINATOR: u128 = 100;

/// Default early-exit penalty in percent. Zero: only the bonus is withheld.
pub const DEFAULT_EARLY_EXIT_PENALTY_PERCENT: u8 = 0;

/// Share of the deposit forfeited when the administrator rules a lock failed.
pub const VERDICT_FAILURE_PENALTY_PERCENT: u8 = 10;

/// Decimal places between nanotons and whole TON.
pub const TON_DECIMALS: u32 = 9;

/// Hard capacity of a single cell, in bits.
pub const CELL_MAX_BITS: usize = 1023;

/// Text carried in the payout message body.
pub const RELEASE_COMMENT: &str = "Lock released";

/// Text carried in the excess-refund message body.
pub const REFUND_COMMENT: &str = "Excess refunded";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "LockStake";
