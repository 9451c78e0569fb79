//! # Escrow wire messages
//!
//! Every body starts with a 32-bit big-endian opcode. Field layouts:
//!
//! ```text
//!   CreateLock     0x66cc0bc1  query_id:u64 amount:coins goal_days:u32 bonus_percent:u8
//!   ReleaseLock    0x9400a3dc  query_id:u64 user:address success:bit
//!   Deploy         0x946a98b6  query_id:u64
//!   DeployOk       0xaff90f57  query_id:u64
//!   FactoryDeploy  0x6d0ff13b  query_id:u64 cashback:address
//!   Comment        0x00000000  text:bytes (UTF-8, rest of the cell)
//! ```
//!
//! Fixed layouts must consume the cell exactly; trailing bits are malformed.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use lockstake_types::{Address, Coins, EscrowError, LockTerms, Result, constants};

use crate::bits::{BitReader, BitString, BitWriter};
use crate::boc;
use crate::cell::CellCodec;
use crate::fields::{read_address, read_coins, write_address, write_coins};

/// Message opcodes.
pub mod opcode {
    pub const COMMENT: u32 = 0x0000_0000;
    pub const CREATE_LOCK: u32 = 0x66CC_0BC1;
    pub const RELEASE_LOCK: u32 = 0x9400_A3DC;
    pub const DEPLOY: u32 = 0x946A_98B6;
    pub const DEPLOY_OK: u32 = 0xAFF9_0F57;
    pub const FACTORY_DEPLOY: u32 = 0x6D0F_F13B;
}

const OPCODE_BITS: usize = 32;

/// Longest comment text that still fits one cell after the opcode.
pub const COMMENT_MAX_BYTES: usize = (constants::CELL_MAX_BITS - OPCODE_BITS) / 8;

fn expect_opcode(r: &mut BitReader<'_>, expected: u32) -> Result<()> {
    let found = r.read_u32("opcode")?;
    if found != expected {
        return Err(EscrowError::InvalidPrefix { opcode: found });
    }
    Ok(())
}

/// A participant's request to lock the attached value (`LockTON`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateLock {
    pub query_id: u64,
    pub amount: Coins,
    pub goal_days: u32,
    pub bonus_percent: u8,
}

impl CreateLock {
    #[must_use]
    pub fn terms(&self) -> LockTerms {
        LockTerms {
            amount: self.amount,
            goal_days: self.goal_days,
            bonus_percent: self.bonus_percent,
        }
    }
}

impl CellCodec for CreateLock {
    fn store(&self, w: &mut BitWriter) {
        w.write_uint(u128::from(opcode::CREATE_LOCK), 32)
            .write_uint(u128::from(self.query_id), 64);
        write_coins(w, self.amount);
        w.write_uint(u128::from(self.goal_days), 32)
            .write_uint(u128::from(self.bonus_percent), 8);
    }

    fn load(r: &mut BitReader<'_>) -> Result<Self> {
        expect_opcode(r, opcode::CREATE_LOCK)?;
        Ok(Self {
            query_id: r.read_u64("query_id")?,
            amount: read_coins(r, "amount")?,
            goal_days: r.read_u32("goal_days")?,
            bonus_percent: r.read_u8("bonus_percent")?,
        })
    }
}

/// The administrator's instruction to close a participant's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseLock {
    pub query_id: u64,
    pub user: Address,
    /// Administrator's verdict; only consulted under the verdict policy.
    pub success: bool,
}

impl CellCodec for ReleaseLock {
    fn store(&self, w: &mut BitWriter) {
        w.write_uint(u128::from(opcode::RELEASE_LOCK), 32)
            .write_uint(u128::from(self.query_id), 64);
        write_address(w, &self.user);
        w.write_bit(self.success);
    }

    fn load(r: &mut BitReader<'_>) -> Result<Self> {
        expect_opcode(r, opcode::RELEASE_LOCK)?;
        Ok(Self {
            query_id: r.read_u64("query_id")?,
            user: read_address(r, "user")?,
            success: r.read_bit("success")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deploy {
    pub query_id: u64,
}

impl CellCodec for Deploy {
    fn store(&self, w: &mut BitWriter) {
        w.write_uint(u128::from(opcode::DEPLOY), 32)
            .write_uint(u128::from(self.query_id), 64);
    }

    fn load(r: &mut BitReader<'_>) -> Result<Self> {
        expect_opcode(r, opcode::DEPLOY)?;
        Ok(Self {
            query_id: r.read_u64("query_id")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployOk {
    pub query_id: u64,
}

impl CellCodec for DeployOk {
    fn store(&self, w: &mut BitWriter) {
        w.write_uint(u128::from(opcode::DEPLOY_OK), 32)
            .write_uint(u128::from(self.query_id), 64);
    }

    fn load(r: &mut BitReader<'_>) -> Result<Self> {
        expect_opcode(r, opcode::DEPLOY_OK)?;
        Ok(Self {
            query_id: r.read_u64("query_id")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryDeploy {
    pub query_id: u64,
    pub cashback: Address,
}

impl CellCodec for FactoryDeploy {
    fn store(&self, w: &mut BitWriter) {
        w.write_uint(u128::from(opcode::FACTORY_DEPLOY), 32)
            .write_uint(u128::from(self.query_id), 64);
        write_address(w, &self.cashback);
    }

    fn load(r: &mut BitReader<'_>) -> Result<Self> {
        expect_opcode(r, opcode::FACTORY_DEPLOY)?;
        Ok(Self {
            query_id: r.read_u64("query_id")?,
            cashback: read_address(r, "cashback")?,
        })
    }
}

/// A plain-text body, as attached to payouts and refunds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    text: String,
}

impl Comment {
    /// # Errors
    /// Returns `InvalidArgument` if the UTF-8 text exceeds
    /// [`COMMENT_MAX_BYTES`].
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.len() > COMMENT_MAX_BYTES {
            return Err(EscrowError::invalid_argument(format!(
                "comment of {} bytes exceeds {COMMENT_MAX_BYTES}",
                text.len()
            )));
        }
        Ok(Self { text })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl CellCodec for Comment {
    fn store(&self, w: &mut BitWriter) {
        w.write_uint(u128::from(opcode::COMMENT), 32)
            .write_bytes(self.text.as_bytes());
    }

    fn load(r: &mut BitReader<'_>) -> Result<Self> {
        expect_opcode(r, opcode::COMMENT)?;
        let remaining = r.remaining();
        if remaining % 8 != 0 {
            return Err(EscrowError::malformed(
                "text",
                format!("{remaining} bits is not a whole number of bytes"),
            ));
        }
        let bytes = r.read_bytes(remaining / 8, "text")?;
        let text = String::from_utf8(bytes)
            .map_err(|e| EscrowError::malformed("text", format!("invalid UTF-8: {e}")))?;
        Ok(Self { text })
    }
}

/// Any message the escrow can send or receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    CreateLock(CreateLock),
    ReleaseLock(ReleaseLock),
    Deploy(Deploy),
    DeployOk(DeployOk),
    FactoryDeploy(FactoryDeploy),
    Comment(Comment),
}

impl Message {
    #[must_use]
    pub fn opcode(&self) -> u32 {
        match self {
            Self::CreateLock(_) => opcode::CREATE_LOCK,
            Self::ReleaseLock(_) => opcode::RELEASE_LOCK,
            Self::Deploy(_) => opcode::DEPLOY,
            Self::DeployOk(_) => opcode::DEPLOY_OK,
            Self::FactoryDeploy(_) => opcode::FACTORY_DEPLOY,
            Self::Comment(_) => opcode::COMMENT,
        }
    }

    /// Wire name of the message kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateLock(_) => "LockTON",
            Self::ReleaseLock(_) => "ReleaseLock",
            Self::Deploy(_) => "Deploy",
            Self::DeployOk(_) => "DeployOk",
            Self::FactoryDeploy(_) => "FactoryDeploy",
            Self::Comment(_) => "Comment",
        }
    }

    #[must_use]
    pub fn query_id(&self) -> Option<u64> {
        match self {
            Self::CreateLock(m) => Some(m.query_id),
            Self::ReleaseLock(m) => Some(m.query_id),
            Self::Deploy(m) => Some(m.query_id),
            Self::DeployOk(m) => Some(m.query_id),
            Self::FactoryDeploy(m) => Some(m.query_id),
            Self::Comment(_) => None,
        }
    }

    /// Text body convenience constructor.
    pub fn comment(text: impl Into<String>) -> Result<Self> {
        Comment::new(text).map(Self::Comment)
    }

    #[must_use]
    pub fn encode(&self) -> BitString {
        match self {
            Self::CreateLock(m) => m.to_cell(),
            Self::ReleaseLock(m) => m.to_cell(),
            Self::Deploy(m) => m.to_cell(),
            Self::DeployOk(m) => m.to_cell(),
            Self::FactoryDeploy(m) => m.to_cell(),
            Self::Comment(m) => m.to_cell(),
        }
    }

    /// Decode a message body, dispatching on its opcode.
    ///
    /// # Errors
    /// `InvalidPrefix` for an unknown opcode, `MalformedField` for a
    /// truncated field, trailing bits or a body larger than one cell.
    pub fn decode(bits: &BitString) -> Result<Self> {
        if !bits.fits_cell() {
            return Err(EscrowError::malformed(
                "payload",
                format!("{} bits exceed one cell", bits.len()),
            ));
        }
        let op = BitReader::new(bits).read_u32("opcode")?;
        let message = match op {
            opcode::CREATE_LOCK => Self::CreateLock(CreateLock::from_cell(bits)?),
            opcode::RELEASE_LOCK => Self::ReleaseLock(ReleaseLock::from_cell(bits)?),
            opcode::DEPLOY => Self::Deploy(Deploy::from_cell(bits)?),
            opcode::DEPLOY_OK => Self::DeployOk(DeployOk::from_cell(bits)?),
            opcode::FACTORY_DEPLOY => Self::FactoryDeploy(FactoryDeploy::from_cell(bits)?),
            opcode::COMMENT => Self::Comment(Comment::from_cell(bits)?),
            other => return Err(EscrowError::InvalidPrefix { opcode: other }),
        };
        tracing::debug!(
            message = message.name(),
            opcode = op,
            bits = bits.len(),
            "Decoded message"
        );
        Ok(message)
    }

    /// Encoded bits as augmented bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode().to_augmented_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(&BitString::from_augmented_bytes(bytes)?)
    }

    /// Single-cell bag of cells.
    #[must_use]
    pub fn to_boc(&self) -> Vec<u8> {
        boc::serialize(&self.encode())
    }

    pub fn from_boc(bytes: &[u8]) -> Result<Self> {
        Self::decode(&boc::deserialize(bytes)?)
    }

    /// Base64 of [`Message::to_boc`], the form wallets pass around.
    #[must_use]
    pub fn to_boc_base64(&self) -> String {
        BASE64.encode(self.to_boc())
    }

    pub fn from_boc_base64(text: &str) -> Result<Self> {
        let bytes = BASE64.decode(text.trim()).map_err(|e| EscrowError::InvalidBoc {
            reason: format!("invalid base64: {e}"),
        })?;
        Self::from_boc(&bytes)
    }
}

impl From<CreateLock> for Message {
    fn from(m: CreateLock) -> Self {
        Self::CreateLock(m)
    }
}

impl From<ReleaseLock> for Message {
    fn from(m: ReleaseLock) -> Self {
        Self::ReleaseLock(m)
    }
}

impl From<Deploy> for Message {
    fn from(m: Deploy) -> Self {
        Self::Deploy(m)
    }
}

impl From<DeployOk> for Message {
    fn from(m: DeployOk) -> Self {
        Self::DeployOk(m)
    }
}

impl From<FactoryDeploy> for Message {
    fn from(m: FactoryDeploy) -> Self {
        Self::FactoryDeploy(m)
    }
}

impl From<Comment> for Message {
    fn from(m: Comment) -> Self {
        Self::Comment(m)
    }
}
