//! # lockstake-escrow
//!
//! The token-locking escrow: participants lock value against a learning
//! goal, the administrator releases it with a bonus or a penalty.
//!
//! ## Pipeline
//!
//! ```text
//!   bytes/BOC ──decode──▶ Message ──plan──▶ Transition ──commit──▶ LockStore
//!                                               │
//!                                               └──▶ outbound effects
//! ```
//!
//! - [`store`]: [`LockStore`], one record per participant
//! - [`machine`]: [`EscrowState`], validate-then-commit transitions
//! - [`payout`]: bonus / penalty arithmetic
//! - [`query`]: read-only getters and [`LockView`]
//! - [`contract`]: [`EscrowContract`], the byte-level entry point
//! - [`determinism`]: SHA-256 state root for replica comparison

pub mod contract;
pub mod determinism;
pub mod machine;
pub mod payout;
pub mod query;
pub mod store;

pub use contract::EscrowContract;
pub use determinism::{compute_state_root, verify_state_root};
pub use machine::{EscrowState, InboundContext, OutboundMessage, Transition, transition};
pub use payout::{Payout, compute_payout};
pub use query::{LockView, get_lock, get_lock_encoded, get_lock_raw, lock_view};
pub use store::LockStore;
