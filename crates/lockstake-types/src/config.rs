//! Configuration types for an escrow instance.

use serde::{Deserialize, Serialize};

use crate::{Address, EscrowError, Result, constants};

/// What decides whether a released lock met its goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalBasis {
    /// Goal met once `goal_days` have elapsed since `lock_time`.
    #[default]
    Elapsed,
    /// Goal met when the administrator's release carries `success = true`.
    Verdict,
}

/// How a release turns a lock record into a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutPolicy {
    pub goal_basis: GoalBasis,
    /// Share of the deposit withheld when the goal is not met.
    pub early_exit_penalty_percent: u8,
}

impl PayoutPolicy {
    /// Verdict-driven payouts, as the ledger contract settles them: the
    /// administrator's success bit decides, failure forfeits 10%.
    #[must_use]
    pub fn verdict() -> Self {
        Self {
            goal_basis: GoalBasis::Verdict,
            early_exit_penalty_percent: constants::VERDICT_FAILURE_PENALTY_PERCENT,
        }
    }
}

impl Default for PayoutPolicy {
    fn default() -> Self {
        Self {
            goal_basis: GoalBasis::Elapsed,
            early_exit_penalty_percent: constants::DEFAULT_EARLY_EXIT_PENALTY_PERCENT,
        }
    }
}

/// Configuration for a single escrow instance.
///
/// `administrator` is fixed when the escrow is initialized and never
/// changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// The only identity allowed to release locks.
    pub administrator: Address,
    /// Payout rules applied on release.
    #[serde(default)]
    pub payout: PayoutPolicy,
    /// Return value attached beyond the lock amount to the sender.
    #[serde(default = "default_refund_excess")]
    pub refund_excess: bool,
    /// Optional operator cap on `goal_days` in lock requests. Unset by
    /// default: any positive `goal_days` is accepted.
    #[serde(default)]
    pub max_goal_days: Option<u32>,
}

fn default_refund_excess() -> bool {
    true
}

impl EscrowConfig {
    /// Default configuration administered by `administrator`.
    #[must_use]
    pub fn new(administrator: Address) -> Self {
        Self {
            administrator,
            payout: PayoutPolicy::default(),
            refund_excess: default_refund_excess(),
            max_goal_days: None,
        }
    }

    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    /// `Serialization` for malformed JSON, `Configuration` for
    /// out-of-range settings.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `Configuration` if a setting is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.payout.early_exit_penalty_percent > constants::MAX_BONUS_PERCENT {
            return Err(EscrowError::Configuration(format!(
                "early_exit_penalty_percent {} is outside 0..=100",
                self.payout.early_exit_penalty_percent
            )));
        }
        if self.max_goal_days == Some(0) {
            return Err(EscrowError::Configuration(
                "max_goal_days must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: &str = "0:1111111111111111111111111111111111111111111111111111111111111111";

    #[test]
    fn defaults() {
        let cfg = EscrowConfig::new(ADMIN.parse().unwrap());
        assert_eq!(cfg.payout.goal_basis, GoalBasis::Elapsed);
        assert_eq!(cfg.payout.early_exit_penalty_percent, 0);
        assert!(cfg.refund_excess);
        assert_eq!(cfg.max_goal_days, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn minimal_json_fills_defaults() {
        let cfg = EscrowConfig::from_json(&format!(r#"{{"administrator":"{ADMIN}"}}"#)).unwrap();
        assert_eq!(cfg, EscrowConfig::new(ADMIN.parse().unwrap()));
    }

    #[test]
    fn verdict_policy_from_json() {
        let json = format!(
            r#"{{"administrator":"{ADMIN}","payout":{{"goal_basis":"verdict","early_exit_penalty_percent":10}},"refund_excess":false}}"#
        );
        let cfg = EscrowConfig::from_json(&json).unwrap();
        assert_eq!(cfg.payout, PayoutPolicy::verdict());
        assert!(!cfg.refund_excess);
    }

    #[test]
    fn rejects_bad_settings() {
        let mut cfg = EscrowConfig::new(ADMIN.parse().unwrap());
        cfg.payout.early_exit_penalty_percent = 101;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            EscrowError::Configuration(_)
        ));

        let json = format!(r#"{{"administrator":"{ADMIN}","max_goal_days":0}}"#);
        assert!(EscrowConfig::from_json(&json).is_err());
    }

    #[test]
    fn goal_cap_from_json() {
        let json = format!(r#"{{"administrator":"{ADMIN}","max_goal_days":365}}"#);
        assert_eq!(EscrowConfig::from_json(&json).unwrap().max_goal_days, Some(365));
    }

    #[test]
    fn rejects_malformed_admin() {
        let err = EscrowConfig::from_json(r#"{"administrator":"not-an-address"}"#).unwrap_err();
        assert!(matches!(err, EscrowError::Serialization(_)));
    }
}
