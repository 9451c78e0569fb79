//! # lockstake-types
//!
//! Shared types, errors, and configuration for the **LockStake** escrow.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`] (workchain + 256-bit hash)
//! - **Amounts**: [`Coins`], bounded to what the wire encoding can carry
//! - **Lock model**: [`LockRecord`], [`LockTerms`], [`LockStatus`]
//! - **Configuration**: [`EscrowConfig`], [`PayoutPolicy`], [`GoalBasis`]
//! - **Errors**: [`EscrowError`] with `ESC_ERR_` prefix codes and [`ErrorKind`]
//! - **Constants**: system-wide limits and defaults

pub mod address;
pub mod coins;
pub mod config;
pub mod constants;
pub mod error;
pub mod lock;

// Re-export all primary types at crate root for ergonomic imports:
//   use lockstake_types::{Address, Coins, LockRecord, ...};

pub use address::*;
pub use coins::*;
pub use config::*;
pub use error::*;
pub use lock::*;

// Constants are accessed via `lockstake_types::constants::FOO`
// (not re-exported to avoid name collisions).
