//! # Compact-Block Relay Subsystem
//!
//! Relays freshly mined blocks with short transaction fingerprints instead of
//! full transactions, reconstructing the block from the receiver's mempool.
//!
//! ## Data Flow
//!
//! ```text
//! CompactAnnouncement ──► BlockReconstructor::init ──► (availability, missing indexes)
//!                                   │
//!                 MempoolView ──────┘ (short-ID lookups, pin retention)
//!                                   │
//!        MissingResponse ──► BlockReconstructor::fill ──► Block
//! ```
//!
//! ## Error Policy
//!
//! Every fallible operation returns [`RelayError`]; [`RelayError::kind`]
//! separates malformed peer data (`Invalid`: disconnect) from normal
//! statistical failure (`Failed`: refetch the block another way).
//!
//! Reference: BIP152 (Compact Block Relay).

pub mod domain;
pub mod error;
pub mod ports;

pub use domain::*;
pub use error::{ErrorKind, RelayError};
pub use ports::outbound::{InMemoryMempool, MempoolView};
