//! State digest for replica comparison.
//!
//! Two escrows that processed the same messages must hold the same
//! records. The `state_root` is a SHA-256 over the administrator and every
//! record in address order, so replicas can compare 32 bytes instead of
//! full snapshots. Insertion order does not affect it.

use lockstake_types::LockRecord;
use sha2::{Digest, Sha256};

use crate::machine::EscrowState;

fn hash_record(hasher: &mut Sha256, record: &LockRecord) {
    hasher.update(record.user.workchain.to_le_bytes());
    hasher.update(record.user.hash);
    hasher.update(u128::from(record.locked_amount).to_le_bytes());
    hasher.update(record.lock_time.to_le_bytes());
    hasher.update(record.goal_days.to_le_bytes());
    hasher.update([record.bonus_percent, u8::from(record.released)]);
}

/// Compute the state root of an escrow.
#[must_use]
pub fn compute_state_root(state: &EscrowState) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"lockstake:state_root:v1:");
    let admin = state.administrator();
    hasher.update(admin.workchain.to_le_bytes());
    hasher.update(admin.hash);
    hasher.update((state.store().len() as u64).to_le_bytes());

    for (_, record) in state.store().iter() {
        hash_record(&mut hasher, record);
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Hex form of [`compute_state_root`], for logs.
#[must_use]
pub fn state_root_hex(state: &EscrowState) -> String {
    hex::encode(compute_state_root(state))
}

#[must_use]
pub fn verify_state_root(state: &EscrowState, expected_root: &[u8; 32]) -> bool {
    compute_state_root(state) == *expected_root
}
