//! Error types for the LockStake escrow.
//!
//! All errors use the `ESC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Codec / wire-format errors
//! - 2xx: Request validation errors
//! - 3xx: Lock state errors
//! - 4xx: Authorization errors
//! - 9xx: General / internal errors
//!
//! Independently of the display code, every business error maps onto the
//! numeric exit code external callers of the on-ledger contract already
//! depend on (see [`EscrowError::exit_code`]).

use thiserror::Error;

use crate::{Address, Coins};

/// The caller-facing error taxonomy.
///
/// Several [`EscrowError`] variants share a kind; callers that only care
/// about the category match on this instead of the full enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown opcode or truncated/malformed field during decode.
    InvalidFormat,
    /// Amount, goal_days or bonus_percent out of the allowed range.
    InvalidArgument,
    /// Attached value is less than the declared lock amount.
    InsufficientValue,
    /// The participant already has a lock record.
    AlreadyLocked,
    /// Release requested for a participant with no record.
    NoLockFound,
    /// Release requested for a record already marked released.
    AlreadyReleased,
    /// Release requested by someone other than the administrator.
    NotAuthorized,
    /// Configuration, persistence or other host-side failure.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InsufficientValue => "INSUFFICIENT_VALUE",
            Self::AlreadyLocked => "ALREADY_LOCKED",
            Self::NoLockFound => "NO_LOCK_FOUND",
            Self::AlreadyReleased => "ALREADY_RELEASED",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::Internal => "INTERNAL",
        };
        f.write_str(name)
    }
}

/// Central error enum for all LockStake operations.
#[derive(Debug, Error)]
pub enum EscrowError {
    // =================================================================
    // Codec Errors (1xx)
    // =================================================================
    /// The leading 32-bit opcode matches no known message.
    #[error("ESC_ERR_100: Invalid prefix: unknown opcode 0x{opcode:08x}")]
    InvalidPrefix { opcode: u32 },

    /// A field was truncated or carried an impossible value.
    #[error("ESC_ERR_101: Malformed field `{field}`: {reason}")]
    MalformedField { field: &'static str, reason: String },

    /// A well-formed message that the escrow has no handler for.
    #[error("ESC_ERR_102: Unexpected message: {message}")]
    UnexpectedMessage { message: &'static str },

    /// Bag-of-cells framing is invalid or unsupported.
    #[error("ESC_ERR_103: Invalid bag of cells: {reason}")]
    InvalidBoc { reason: String },

    /// A textual account identifier could not be parsed.
    #[error("ESC_ERR_104: Invalid address `{input}`: {reason}")]
    InvalidAddress { input: String, reason: String },

    // =================================================================
    // Request Validation Errors (2xx)
    // =================================================================
    /// Lock terms out of range.
    #[error("ESC_ERR_200: Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The value attached to a lock request does not cover the amount.
    #[error("ESC_ERR_201: Insufficient value sent: need {needed}, attached {attached}")]
    InsufficientValue { needed: Coins, attached: Coins },

    // =================================================================
    // Lock State Errors (3xx)
    // =================================================================
    /// The participant already holds a lock record.
    #[error("ESC_ERR_300: Already locked: {0}")]
    AlreadyLocked(Address),

    /// No lock record exists for the participant.
    #[error("ESC_ERR_301: No lock found: {0}")]
    NoLockFound(Address),

    /// The lock record was already released.
    #[error("ESC_ERR_302: Already released: {0}")]
    AlreadyReleased(Address),

    // =================================================================
    // Authorization Errors (4xx)
    // =================================================================
    /// Only the administrator may release locks.
    #[error("ESC_ERR_400: Only owner can release: caller {caller}")]
    NotAuthorized { caller: Address },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("ESC_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error (snapshots, config files).
    #[error("ESC_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, out-of-range settings).
    #[error("ESC_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl EscrowError {
    /// Shorthand for a [`EscrowError::MalformedField`].
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedField {
            field,
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`EscrowError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// The taxonomy bucket this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPrefix { .. }
            | Self::MalformedField { .. }
            | Self::UnexpectedMessage { .. }
            | Self::InvalidBoc { .. }
            | Self::InvalidAddress { .. } => ErrorKind::InvalidFormat,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InsufficientValue { .. } => ErrorKind::InsufficientValue,
            Self::AlreadyLocked(_) => ErrorKind::AlreadyLocked,
            Self::NoLockFound(_) => ErrorKind::NoLockFound,
            Self::AlreadyReleased(_) => ErrorKind::AlreadyReleased,
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::Internal(_) | Self::Serialization(_) | Self::Configuration(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Exit code reported by the on-ledger contract for the same failure.
    ///
    /// `None` for host-side errors that never cross the wire.
    #[must_use]
    pub fn exit_code(&self) -> Option<u32> {
        match self {
            Self::MalformedField { .. } | Self::InvalidBoc { .. } => Some(9),
            Self::InvalidPrefix { .. } | Self::UnexpectedMessage { .. } => Some(130),
            Self::InvalidArgument { .. } => Some(134),
            Self::InvalidAddress { .. } => Some(136),
            Self::NoLockFound(_) => Some(2771),
            Self::AlreadyReleased(_) => Some(23215),
            Self::NotAuthorized { .. } => Some(27736),
            Self::AlreadyLocked(_) => Some(43692),
            Self::InsufficientValue { .. } => Some(62441),
            Self::Internal(_) | Self::Serialization(_) | Self::Configuration(_) => None,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EscrowError>;

impl From<serde_json::Error> for EscrowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
