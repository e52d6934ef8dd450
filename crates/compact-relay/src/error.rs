//! Error types for the compact-block relay subsystem.

use relay_types::wire::DecodeError;
use thiserror::Error;

/// How a caller should treat a relay failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The peer sent structurally malformed or impossible data.
    /// Policy: disconnect / ban the peer.
    Invalid,
    /// Structurally valid but locally unprocessable.
    /// Policy: request the block another way, e.g. as a full block.
    Failed,
}

/// Errors raised while decoding or reconstructing a compact block.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("announcement header is null")]
    NullHeader,

    #[error("announcement carries no short IDs and no prefilled transactions")]
    EmptyAnnouncement,

    #[error("announced transaction count {count} exceeds relay bound {max}")]
    TooManyTransactions { count: u64, max: u64 },

    #[error("prefilled transaction {position} is null")]
    NullPrefilled { position: usize },

    #[error("prefilled transaction {position} claims unreachable slot {index}")]
    UnreachablePrefill { position: usize, index: u16 },

    #[error("prefilled index running sum overflowed 16 bits")]
    PrefilledIndexOverflow,

    #[error("request index running sum overflowed 32 bits")]
    RequestIndexOverflow,

    #[error("two short IDs in one announcement collide")]
    ShortIdCollision,

    #[error("peer-supplied transactions exhausted at slot {slot}")]
    MissingTransactionsExhausted { slot: usize },

    #[error("{extra} peer-supplied transactions left unused")]
    UnusedMissingTransactions { extra: usize },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl RelayError {
    /// Classifies this error for the caller's peer policy.
    ///
    /// Short-ID collisions are a normal statistical event under an unlucky
    /// nonce; everything else means the peer sent data no honest
    /// implementation produces.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::ShortIdCollision => ErrorKind::Failed,
            _ => ErrorKind::Invalid,
        }
    }
}
