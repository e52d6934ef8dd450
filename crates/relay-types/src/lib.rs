//! # Relay Types Crate
//!
//! Shared chain primitives for the compact-block relay workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: block/transaction primitives and their wire
//!   forms are defined here and consumed by every other crate.
//! - **Two serialization worlds**: the hand-rolled byte codec in [`wire`] is
//!   the peer-to-peer format and is bit-exact; the serde derives on entities
//!   exist for tooling and storage layers and never touch the network.
//! - **No consensus logic**: these types carry data. Validation lives with
//!   their consumers.

pub mod entities;
pub mod hashing;
pub mod wire;

pub use entities::*;
pub use hashing::{sha256, sha256d, sha256_many};
