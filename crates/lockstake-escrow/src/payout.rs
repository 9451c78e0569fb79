//! Payout computation for a release.
//!
//! ```text
//!   goal met      payout = amount + amount * bonus_percent / 100
//!   goal missed   payout = amount - amount * early_exit_penalty_percent / 100
//! ```
//!
//! Integer division truncates; the bonus can never overflow because
//! [`lockstake_types::LockTerms::validate`] rejects terms whose full
//! payout is not representable.

use lockstake_types::{Coins, EscrowError, GoalBasis, LockRecord, PayoutPolicy, Result};
use serde::{Deserialize, Serialize};

/// Outcome of applying a payout policy to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Value sent to the participant.
    pub amount: Coins,
    pub goal_met: bool,
    /// Added on top of the deposit (zero unless `goal_met`).
    pub bonus: Coins,
    /// Withheld from the deposit (zero when `goal_met`).
    pub penalty: Coins,
}

/// Decide whether `record` met its goal at `now` under `policy`.
///
/// `success` is the administrator's verdict and only matters for
/// [`GoalBasis::Verdict`].
#[must_use]
pub fn goal_met(record: &LockRecord, now: u32, success: bool, policy: &PayoutPolicy) -> bool {
    match policy.goal_basis {
        GoalBasis::Elapsed => record.goal_reached(now),
        GoalBasis::Verdict => success,
    }
}

/// # Errors
/// Returns `Internal` if the arithmetic overflows, which validated
/// records never trigger.
pub fn compute_payout(
    record: &LockRecord,
    now: u32,
    success: bool,
    policy: &PayoutPolicy,
) -> Result<Payout> {
    let amount = record.locked_amount;
    let overflow = || EscrowError::Internal(format!("payout overflow for {}", record.user));

    if goal_met(record, now, success, policy) {
        let bonus = amount
            .checked_percent(record.bonus_percent)
            .ok_or_else(overflow)?;
        Ok(Payout {
            amount: amount.checked_add(bonus).ok_or_else(overflow)?,
            goal_met: true,
            bonus,
            penalty: Coins::ZERO,
        })
    } else {
        let penalty = amount
            .checked_percent(policy.early_exit_penalty_percent)
            .ok_or_else(overflow)?;
        Ok(Payout {
            amount: amount.checked_sub(penalty).ok_or_else(overflow)?,
            goal_met: false,
            bonus: Coins::ZERO,
            penalty,
        })
    }
}

#[cfg(test)]
mod tests {
    use lockstake_types::constants::SECONDS_PER_DAY;

    use super::*;

    fn days(d: u32) -> u32 {
        d * u32::try_from(SECONDS_PER_DAY).unwrap()
    }

    #[test]
    fn goal_met_pays_bonus() {
        let record = LockRecord::dummy(1_000, 30, 5);
        let p = compute_payout(
            &record,
            record.lock_time + days(30),
            false,
            &PayoutPolicy::default(),
        )
        .unwrap();
        assert!(p.goal_met);
        assert_eq!(p.bonus, Coins::from_nanos(50));
        assert_eq!(p.amount, Coins::from_nanos(1_050));
    }

    #[test]
    fn bonus_truncates() {
        // 10 * 5 / 100 = 0.5 -> 0
        let record = LockRecord::dummy(10, 30, 5);
        let p = compute_payout(
            &record,
            record.lock_time + days(31),
            false,
            &PayoutPolicy::default(),
        )
        .unwrap();
        assert_eq!(p.amount, Coins::from_nanos(10));
        assert!(p.goal_met);
    }

    #[test]
    fn early_release_default_no_penalty() {
        let record = LockRecord::dummy(1_000, 30, 5);
        let p = compute_payout(
            &record,
            record.lock_time + days(10),
            true,
            &PayoutPolicy::default(),
        )
        .unwrap();
        assert!(!p.goal_met, "elapsed basis ignores the verdict");
        assert_eq!(p.amount, Coins::from_nanos(1_000));
        assert_eq!(p.penalty, Coins::ZERO);
    }

    #[test]
    fn early_release_with_penalty() {
        let record = LockRecord::dummy(1_000, 30, 5);
        let policy = PayoutPolicy {
            goal_basis: GoalBasis::Elapsed,
            early_exit_penalty_percent: 25,
        };
        let p = compute_payout(&record, record.lock_time + days(1), false, &policy).unwrap();
        assert_eq!(p.penalty, Coins::from_nanos(250));
        assert_eq!(p.amount, Coins::from_nanos(750));
    }

    #[test]
    fn verdict_policy() {
        let record = LockRecord::dummy(1_000, 30, 20);
        let policy = PayoutPolicy::verdict();
        let now = record.lock_time;

        let ok = compute_payout(&record, now, true, &policy).unwrap();
        assert_eq!(ok.amount, Coins::from_nanos(1_200));

        let failed = compute_payout(&record, now + days(100), false, &policy).unwrap();
        assert!(!failed.goal_met);
        assert_eq!(failed.amount, Coins::from_nanos(900));
    }

    #[test]
    fn clock_skew_counts_as_not_elapsed() {
        let record = LockRecord::dummy(1_000, 1, 50);
        let p = compute_payout(&record, 0, false, &PayoutPolicy::default()).unwrap();
        assert!(!p.goal_met);
        assert_eq!(p.amount, Coins::from_nanos(1_000));
    }

    #[test]
    fn full_penalty_pays_zero() {
        let record = LockRecord::dummy(1_000, 30, 5);
        let policy = PayoutPolicy {
            goal_basis: GoalBasis::Verdict,
            early_exit_penalty_percent: 100,
        };
        let p = compute_payout(&record, record.lock_time, false, &policy).unwrap();
        assert_eq!(p.amount, Coins::ZERO);
    }
}
