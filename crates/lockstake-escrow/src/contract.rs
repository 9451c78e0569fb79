//! Contract entry point: decode → apply → effects.
//!
//! [`EscrowContract`] owns the state outright. `receive*` take `&mut self`,
//! so one message is fully validated and committed before the next one
//! starts. Hosts that share a contract across threads wrap it in a mutex.

use lockstake_codec::{BitString, Message};
use lockstake_types::{Address, EscrowConfig, EscrowError, LockRecord, Result, constants};

use crate::determinism;
use crate::machine::{EscrowState, InboundContext, OutboundMessage, Transition};
use crate::query::{self, LockView};
use crate::store::LockStore;

/// A single escrow instance.
#[derive(Debug, Clone)]
pub struct EscrowContract {
    state: EscrowState,
}

impl EscrowContract {
    /// Initialize an escrow with an empty store.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` is out of range.
    pub fn new(config: EscrowConfig) -> Result<Self> {
        let state = EscrowState::new(config)?;
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            administrator = %state.administrator(),
            goal_basis = ?state.config().payout.goal_basis,
            "Escrow initialized"
        );
        Ok(Self { state })
    }

    /// Initialize from a JSON configuration document.
    pub fn from_config_json(json: &str) -> Result<Self> {
        Self::new(EscrowConfig::from_json(json)?)
    }

    /// Resume from a [`EscrowContract::snapshot`].
    pub fn restore(config: EscrowConfig, snapshot: &str) -> Result<Self> {
        let store = LockStore::restore(snapshot)?;
        let state = EscrowState::with_store(config, store)?;
        tracing::info!(
            locks = state.store().len(),
            active = state.store().active_count(),
            "Escrow restored"
        );
        Ok(Self { state })
    }

    #[must_use]
    pub fn state(&self) -> &EscrowState {
        &self.state
    }

    /// Handle a body given as augmented bytes.
    ///
    /// # Errors
    /// Any decode error, or any rejection from the state machine. The
    /// state is unchanged on error.
    pub fn receive(&mut self, ctx: &InboundContext, body: &[u8]) -> Result<Vec<OutboundMessage>> {
        let bits = BitString::from_augmented_bytes(body)
            .inspect_err(|e| log_undecodable(ctx, e))?;
        self.receive_bits(ctx, &bits)
    }

    /// Handle a body given as a single-cell bag of cells.
    pub fn receive_boc(&mut self, ctx: &InboundContext, boc: &[u8]) -> Result<Vec<OutboundMessage>> {
        let msg = Message::from_boc(boc).inspect_err(|e| log_undecodable(ctx, e))?;
        self.receive_message(ctx, &msg)
    }

    pub fn receive_bits(
        &mut self,
        ctx: &InboundContext,
        bits: &BitString,
    ) -> Result<Vec<OutboundMessage>> {
        let msg = Message::decode(bits).inspect_err(|e| log_undecodable(ctx, e))?;
        self.receive_message(ctx, &msg)
    }

    /// Handle an already decoded message.
    pub fn receive_message(
        &mut self,
        ctx: &InboundContext,
        msg: &Message,
    ) -> Result<Vec<OutboundMessage>> {
        self.execute(ctx, msg).map(|t| t.effects)
    }

    /// Like [`EscrowContract::receive_message`] but returns the full
    /// transition, including the written record and payout breakdown.
    pub fn execute(&mut self, ctx: &InboundContext, msg: &Message) -> Result<Transition> {
        self.state.apply(ctx, msg)
    }

    #[must_use]
    pub fn get_lock(&self, user: &Address) -> Option<LockRecord> {
        query::get_lock(&self.state, user)
    }

    pub fn get_lock_raw(&self, raw: &str) -> Result<Option<LockRecord>> {
        query::get_lock_raw(&self.state, raw)
    }

    pub fn get_lock_encoded(&self, address: &BitString) -> Result<Option<BitString>> {
        query::get_lock_encoded(&self.state, address)
    }

    #[must_use]
    pub fn lock_view(&self, user: &Address, now: u32) -> Option<LockView> {
        query::lock_view(&self.state, user, now)
    }

    #[must_use]
    pub fn state_root(&self) -> [u8; 32] {
        determinism::compute_state_root(&self.state)
    }

    /// JSON snapshot of the lock store.
    pub fn snapshot(&self) -> Result<String> {
        self.state.store().snapshot()
    }
}

fn log_undecodable(ctx: &InboundContext, err: &EscrowError) {
    tracing::warn!(
        sender = %ctx.sender.short(),
        exit_code = ?err.exit_code(),
        error = %err,
        "Undecodable message"
    );
}

#[cfg(test)]
mod tests {
    use lockstake_codec::{CreateLock, Deploy};
    use lockstake_types::Coins;

    use super::*;

    const T0: u32 = 1_700_000_000;

    fn lock_body(amount: u64) -> Message {
        CreateLock {
            query_id: 9,
            amount: Coins::from_nanos(amount),
            goal_days: 7,
            bonus_percent: 10,
        }
        .into()
    }

    #[test]
    fn receive_bytes_and_boc() {
        let admin = Address::random();
        let mut contract = EscrowContract::new(EscrowConfig::new(admin)).unwrap();

        let alice = Address::random();
        let ctx = InboundContext::new(alice, Coins::from_nanos(100), T0);
        let effects = contract.receive(&ctx, &lock_body(100).to_bytes()).unwrap();
        assert!(effects.is_empty());
        assert!(contract.get_lock(&alice).is_some());

        let bob = Address::random();
        let ctx = InboundContext::new(bob, Coins::from_nanos(100), T0);
        contract.receive_boc(&ctx, &lock_body(100).to_boc()).unwrap();
        assert_eq!(contract.state().store().len(), 2);
    }

    #[test]
    fn undecodable_body_leaves_state() {
        let mut contract = EscrowContract::new(EscrowConfig::new(Address::random())).unwrap();
        let root = contract.state_root();
        let ctx = InboundContext::new(Address::random(), Coins::from_nanos(100), T0);

        let err = contract.receive(&ctx, &[0xde, 0xad, 0xbe, 0xef, 0x80]).unwrap_err();
        assert!(matches!(err, EscrowError::InvalidPrefix { .. }));
        assert!(contract.receive_boc(&ctx, b"garbage").is_err());
        assert_eq!(contract.state_root(), root);
    }

    #[test]
    fn deploy_roundtrip() {
        let mut contract = EscrowContract::new(EscrowConfig::new(Address::random())).unwrap();
        let ctx = InboundContext::new(Address::random(), Coins::from_nanos(3), T0);
        let effects = contract
            .receive(&ctx, &Message::from(Deploy { query_id: 5 }).to_bytes())
            .unwrap();
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].body.query_id(), Some(5));
    }

    #[test]
    fn snapshot_restore_preserves_root() {
        let admin = Address::random();
        let config = EscrowConfig::new(admin);
        let mut contract = EscrowContract::new(config.clone()).unwrap();
        for _ in 0..4 {
            let ctx = InboundContext::new(Address::random(), Coins::from_nanos(50), T0);
            contract.receive_message(&ctx, &lock_body(50)).unwrap();
        }
        let restored = EscrowContract::restore(config, &contract.snapshot().unwrap()).unwrap();
        assert_eq!(restored.state_root(), contract.state_root());
    }

    #[test]
    fn config_from_json() {
        let admin = Address::random();
        let json = format!(r#"{{"administrator":"{admin}","refund_excess":false}}"#);
        let contract = EscrowContract::from_config_json(&json).unwrap();
        assert_eq!(contract.state().administrator(), admin);
        assert!(!contract.state().config().refund_excess);
    }
}
