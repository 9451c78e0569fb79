//! # Escrow state machine
//!
//! Every inbound message goes through two steps:
//!
//! 1. [`EscrowState::plan`] validates the message against the current
//!    store and returns a [`Transition`]: the record to write and the
//!    outbound messages to emit. It takes `&self` and cannot mutate.
//! 2. [`EscrowState::commit`] applies the write-set.
//!
//! A rejected message therefore leaves the store untouched and produces
//! no effects. [`EscrowState::apply`] runs both steps.
//!
//! ## Check order
//!
//! ```text
//!   CreateLock   terms in range → attached ≥ amount → no record for sender
//!   ReleaseLock  caller is administrator → record exists → not released
//! ```

use chrono::Utc;
use lockstake_codec::{Comment, CreateLock, DeployOk, Message, ReleaseLock};
use lockstake_types::{
    Address, Coins, EscrowConfig, EscrowError, LockRecord, LockStatus, Result, constants,
};

use crate::payout::{Payout, compute_payout};
use crate::store::LockStore;

/// Who sent a message, what value it carried and when it arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundContext {
    pub sender: Address,
    /// Value attached to the message.
    pub value: Coins,
    /// Ledger time, seconds since the UNIX epoch.
    pub now: u32,
}

impl InboundContext {
    #[must_use]
    pub fn new(sender: Address, value: Coins, now: u32) -> Self {
        Self { sender, value, now }
    }

    /// Context stamped with the host's wall clock.
    ///
    /// # Errors
    /// Returns `Internal` if the clock is outside the 32-bit ledger range.
    pub fn at_current_time(sender: Address, value: Coins) -> Result<Self> {
        let now = u32::try_from(Utc::now().timestamp())
            .map_err(|_| EscrowError::Internal("system clock outside the u32 range".into()))?;
        Ok(Self::new(sender, value, now))
    }
}

/// A message the escrow sends as a result of a committed transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: Address,
    pub value: Coins,
    /// Whether the recipient may bounce the value back on failure.
    pub bounce: bool,
    pub body: Message,
}

impl OutboundMessage {
    fn comment(to: Address, value: Coins, bounce: bool, text: &str) -> Result<Self> {
        Ok(Self {
            to,
            value,
            bounce,
            body: Comment::new(text)?.into(),
        })
    }
}

/// The outcome of planning a message: a write-set plus effects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// Record to store under `record.user`.
    pub write: Option<LockRecord>,
    /// Set for releases.
    pub payout: Option<Payout>,
    pub effects: Vec<OutboundMessage>,
}

/// Administrator plus lock store: everything a transition reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowState {
    config: EscrowConfig,
    store: LockStore,
}

impl EscrowState {
    /// Fresh state with an empty store.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` is out of range.
    pub fn new(config: EscrowConfig) -> Result<Self> {
        Self::with_store(config, LockStore::new())
    }

    /// State over an existing (e.g. restored) store.
    pub fn with_store(config: EscrowConfig, store: LockStore) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, store })
    }

    #[must_use]
    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    #[must_use]
    pub fn administrator(&self) -> Address {
        self.config.administrator
    }

    #[must_use]
    pub fn store(&self) -> &LockStore {
        &self.store
    }

    /// Validate `msg` and compute its effects without mutating anything.
    ///
    /// # Errors
    /// - `InvalidArgument`, `InsufficientValue`, `AlreadyLocked` for lock requests
    /// - `NotAuthorized`, `NoLockFound`, `AlreadyReleased` for releases
    /// - `UnexpectedMessage` for messages the escrow only ever sends
    pub fn plan(&self, ctx: &InboundContext, msg: &Message) -> Result<Transition> {
        match msg {
            Message::CreateLock(req) => self.plan_lock(ctx, req),
            Message::ReleaseLock(req) => self.plan_release(ctx, req),
            Message::Deploy(req) => Ok(Transition {
                write: None,
                payout: None,
                effects: vec![OutboundMessage {
                    to: ctx.sender,
                    value: ctx.value,
                    bounce: false,
                    body: DeployOk {
                        query_id: req.query_id,
                    }
                    .into(),
                }],
            }),
            Message::DeployOk(_) | Message::FactoryDeploy(_) | Message::Comment(_) => {
                Err(EscrowError::UnexpectedMessage {
                    message: msg.name(),
                })
            }
        }
    }

    fn plan_lock(&self, ctx: &InboundContext, req: &CreateLock) -> Result<Transition> {
        let terms = req.terms();
        terms.validate(self.config.max_goal_days)?;

        if ctx.value < terms.amount {
            return Err(EscrowError::InsufficientValue {
                needed: terms.amount,
                attached: ctx.value,
            });
        }

        let status = LockStatus::of(self.store.get(&ctx.sender));
        if !status.can_transition_to(LockStatus::Locked) {
            return Err(EscrowError::AlreadyLocked(ctx.sender));
        }

        let mut effects = Vec::new();
        let excess = ctx
            .value
            .checked_sub(terms.amount)
            .ok_or_else(|| EscrowError::Internal("excess underflow".into()))?;
        if self.config.refund_excess && !excess.is_zero() {
            effects.push(OutboundMessage::comment(
                ctx.sender,
                excess,
                true,
                constants::REFUND_COMMENT,
            )?);
        }

        Ok(Transition {
            write: Some(LockRecord::new(ctx.sender, terms, ctx.now)),
            payout: None,
            effects,
        })
    }

    fn plan_release(&self, ctx: &InboundContext, req: &ReleaseLock) -> Result<Transition> {
        if ctx.sender != self.config.administrator {
            return Err(EscrowError::NotAuthorized { caller: ctx.sender });
        }

        let record = self
            .store
            .get(&req.user)
            .ok_or(EscrowError::NoLockFound(req.user))?;

        let mut updated = *record;
        updated.mark_released()?;

        let payout = compute_payout(record, ctx.now, req.success, &self.config.payout)?;
        let effect = OutboundMessage::comment(
            record.user,
            payout.amount,
            false,
            constants::RELEASE_COMMENT,
        )?;

        Ok(Transition {
            write: Some(updated),
            payout: Some(payout),
            effects: vec![effect],
        })
    }

    /// Apply a planned write-set.
    ///
    /// The write is re-checked against the current store, so a stale or
    /// hand-built transition can neither overwrite a record nor undo a
    /// release. Creations go through [`LockStore::insert_new`].
    ///
    /// # Errors
    /// - `AlreadyLocked` if the slot is already locked
    /// - `AlreadyReleased` if the stored record is released
    /// - `Internal` if the write is not the stored record with
    ///   `released` flipped, or creates an already released record
    pub fn commit(&mut self, transition: &Transition) -> Result<()> {
        let Some(record) = transition.write else {
            return Ok(());
        };
        let current = self.store.get(&record.user);
        let from = LockStatus::of(current);
        if !from.can_transition_to(record.status()) {
            return Err(match from {
                LockStatus::NoLock => EscrowError::Internal(format!(
                    "new record for {} is already released",
                    record.user
                )),
                LockStatus::Locked => EscrowError::AlreadyLocked(record.user),
                LockStatus::Released => EscrowError::AlreadyReleased(record.user),
            });
        }
        match current {
            None => self.store.insert_new(record),
            Some(stored) if record == (LockRecord { released: true, ..*stored }) => {
                self.store.put(record.user, record);
                Ok(())
            }
            Some(_) => Err(EscrowError::Internal(format!(
                "release write for {} changes the stored terms",
                record.user
            ))),
        }
    }

    /// Plan, then commit on success.
    ///
    /// # Errors
    /// Any error from [`EscrowState::plan`] or [`EscrowState::commit`];
    /// the state is unchanged.
    pub fn apply(&mut self, ctx: &InboundContext, msg: &Message) -> Result<Transition> {
        let transition = match self.plan(ctx, msg) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(
                    message = msg.name(),
                    sender = %ctx.sender.short(),
                    kind = %e.kind(),
                    exit_code = ?e.exit_code(),
                    error = %e,
                    "Message rejected"
                );
                return Err(e);
            }
        };
        self.commit(&transition)?;

        match (&transition.write, &transition.payout) {
            (Some(record), Some(payout)) => tracing::info!(
                user = %record.user.short(),
                payout = %payout.amount,
                goal_met = payout.goal_met,
                "Lock released"
            ),
            (Some(record), None) => tracing::info!(
                user = %record.user.short(),
                amount = %record.locked_amount,
                goal_days = record.goal_days,
                bonus_percent = record.bonus_percent,
                "Lock created"
            ),
            _ => tracing::debug!(
                message = msg.name(),
                effects = transition.effects.len(),
                "Message handled without state change"
            ),
        }
        Ok(transition)
    }
}

/// Functional form of [`EscrowState::apply`]: the successor state and its
/// effects, with `state` left as it was.
///
/// # Errors
/// Any error from [`EscrowState::plan`] or [`EscrowState::commit`].
pub fn transition(
    state: &EscrowState,
    ctx: &InboundContext,
    msg: &Message,
) -> Result<(EscrowState, Vec<OutboundMessage>)> {
    let planned = state.plan(ctx, msg)?;
    let mut next = state.clone();
    next.commit(&planned)?;
    Ok((next, planned.effects))
}
