//! # Lock records: one participant's committed deposit
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  CreateLock   ┌────────┐  ReleaseLock   ┌──────────┐
//!   │ NO_LOCK├──────────────▶│ LOCKED ├───────────────▶│ RELEASED │
//!   └────────┘               └────────┘   (admin)      └──────────┘
//! ```
//!
//! The status is a derived view over the stored record, never a stored tag:
//! no record → `NoLock`, `released == false` → `Locked`, otherwise
//! `Released`. Released records are retained.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Coins, EscrowError, Result, constants};

/// Derived lifecycle status of a participant's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockStatus {
    /// No record stored for the participant.
    NoLock,
    /// Deposit held, not yet released.
    Locked,
    /// Payout issued. **Irreversible.**
    Released,
}

impl LockStatus {
    /// Status of an optional stored record.
    #[must_use]
    pub fn of(record: Option<&LockRecord>) -> Self {
        match record {
            None => Self::NoLock,
            Some(r) if r.released => Self::Released,
            Some(_) => Self::Locked,
        }
    }

    /// Can a slot in this status move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::NoLock, Self::Locked) | (Self::Locked, Self::Released)
        )
    }
}

impl std::fmt::Display for LockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoLock => write!(f, "NO_LOCK"),
            Self::Locked => write!(f, "LOCKED"),
            Self::Released => write!(f, "RELEASED"),
        }
    }
}

/// The terms a participant asks for in a lock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockTerms {
    pub amount: Coins,
    pub goal_days: u32,
    pub bonus_percent: u8,
}

impl LockTerms {
    /// Range checks for a new lock.
    ///
    /// Besides the per-field bounds, the largest payout these terms can
    /// produce (`amount + amount * bonus / 100`) must itself be encodable,
    /// so a later release can never overflow.
    ///
    /// # Errors
    /// Returns `InvalidArgument` naming the first offending field.
    pub fn validate(&self, max_goal_days: Option<u32>) -> Result<()> {
        if self.amount.is_zero() {
            return Err(EscrowError::invalid_argument("amount must be > 0"));
        }
        if self.goal_days == 0 {
            return Err(EscrowError::invalid_argument("goal_days must be > 0"));
        }
        if let Some(max) = max_goal_days
            && self.goal_days > max
        {
            return Err(EscrowError::invalid_argument(format!(
                "goal_days {} exceeds the maximum of {max}",
                self.goal_days
            )));
        }
        if self.bonus_percent > constants::MAX_BONUS_PERCENT {
            return Err(EscrowError::invalid_argument(format!(
                "bonus_percent {} is outside 0..={}",
                self.bonus_percent,
                constants::MAX_BONUS_PERCENT
            )));
        }
        let bonus = self
            .amount
            .checked_percent(self.bonus_percent)
            .ok_or_else(|| EscrowError::invalid_argument("bonus is not representable"))?;
        if self.amount.checked_add(bonus).is_none() {
            return Err(EscrowError::invalid_argument(format!(
                "amount {} with {}% bonus overflows the coins range",
                self.amount, self.bonus_percent
            )));
        }
        Ok(())
    }
}

/// The persisted state of one participant's deposit and its terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Participant that created the lock. Immutable.
    pub user: Address,
    /// Deposit held in escrow.
    pub locked_amount: Coins,
    /// Creation time, seconds since the UNIX epoch.
    pub lock_time: u32,
    /// Commitment window in days.
    pub goal_days: u32,
    /// Reward rate paid when the goal is met.
    pub bonus_percent: u8,
    /// Set exactly once, by a successful release.
    pub released: bool,
}

impl LockRecord {
    /// A fresh, unreleased record.
    #[must_use]
    pub fn new(user: Address, terms: LockTerms, lock_time: u32) -> Self {
        Self {
            user,
            locked_amount: terms.amount,
            lock_time,
            goal_days: terms.goal_days,
            bonus_percent: terms.bonus_percent,
            released: false,
        }
    }

    #[must_use]
    pub fn terms(&self) -> LockTerms {
        LockTerms {
            amount: self.locked_amount,
            goal_days: self.goal_days,
            bonus_percent: self.bonus_percent,
        }
    }

    #[must_use]
    pub fn status(&self) -> LockStatus {
        LockStatus::of(Some(self))
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.released
    }

    /// Length of the commitment window in seconds.
    #[must_use]
    pub fn goal_seconds(&self) -> u64 {
        u64::from(self.goal_days) * constants::SECONDS_PER_DAY
    }

    /// Earliest time (seconds since epoch) at which the goal counts as met.
    #[must_use]
    pub fn unlock_time(&self) -> u64 {
        u64::from(self.lock_time) + self.goal_seconds()
    }

    /// Seconds since the lock was created; zero if `now` precedes it.
    #[must_use]
    pub fn elapsed(&self, now: u32) -> u64 {
        u64::from(now.saturating_sub(self.lock_time))
    }

    #[must_use]
    pub fn goal_reached(&self, now: u32) -> bool {
        self.elapsed(now) >= self.goal_seconds()
    }

    #[must_use]
    pub fn locked_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.lock_time), 0)
    }

    #[must_use]
    pub fn unlock_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.unlock_time()).ok()?, 0)
    }

    /// Re-check the stored-record invariants (used when restoring snapshots).
    ///
    /// # Errors
    /// Returns `InvalidArgument` if amount, goal_days or bonus_percent is
    /// out of range.
    pub fn validate(&self) -> Result<()> {
        self.terms().validate(None)
    }

    /// Flip `released` false → true.
    ///
    /// # Errors
    /// Returns `AlreadyReleased` if the record was released before.
    pub fn mark_released(&mut self) -> Result<()> {
        if !self.status().can_transition_to(LockStatus::Released) {
            return Err(EscrowError::AlreadyReleased(self.user));
        }
        self.released = true;
        Ok(())
    }
}

/// Dummy record for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl LockRecord {
    pub fn dummy(amount: u64, goal_days: u32, bonus_percent: u8) -> Self {
        Self::new(
            Address::random(),
            LockTerms {
                amount: Coins::from_nanos(amount),
                goal_days,
                bonus_percent,
            },
            1_700_000_000,
        )
    }
}
