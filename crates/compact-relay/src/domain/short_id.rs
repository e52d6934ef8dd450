//! Short-ID derivation for compact announcements.
//!
//! Every announcement keys its own fingerprint function from the block header
//! and a random nonce, so an adversary cannot precompute a transaction that
//! collides in every announcement.
//!
//! Reference: BIP152 (Compact Block Relay), short transaction ID calculation.

use std::hash::Hasher;

use relay_types::hashing::sha256_many;
use relay_types::wire::WireEncode;
use relay_types::{BlockHeader, Hash, TxHash};
use siphasher::sip::SipHasher24;

/// A 48-bit transaction fingerprint carried in a u64.
///
/// The top 16 bits are always zero; the wire form is 6 little-endian bytes.
pub type ShortId = u64;

/// Mask selecting the 48 fingerprint bits.
pub const SHORT_ID_MASK: u64 = 0xFFFF_FFFF_FFFF;

/// Keyed fingerprint function derived from one announcement.
///
/// The selector digest is `SHA256(serialize(header) || le64(nonce))`; its
/// first 16 bytes are two little-endian u64 words keying SipHash-2-4.
/// Computed once per announcement and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortIdSelector {
    digest: Hash,
    k0: u64,
    k1: u64,
}

impl ShortIdSelector {
    /// Derives the selector for `(header, nonce)`.
    pub fn derive(header: &BlockHeader, nonce: u64) -> Self {
        let digest = sha256_many(&[&header.to_bytes(), &nonce.to_le_bytes()]);
        let k0 = u64::from_le_bytes(digest[0..8].try_into().expect("8-byte slice"));
        let k1 = u64::from_le_bytes(digest[8..16].try_into().expect("8-byte slice"));
        Self { digest, k0, k1 }
    }

    /// The full 256-bit selector digest.
    pub fn digest(&self) -> &Hash {
        &self.digest
    }

    /// Fingerprints a transaction hash: SipHash-2-4 under the selector keys,
    /// truncated to the low 48 bits.
    pub fn short_id(&self, tx_hash: &TxHash) -> ShortId {
        let mut hasher = SipHasher24::new_with_keys(self.k0, self.k1);
        hasher.write(tx_hash);
        hasher.finish() & SHORT_ID_MASK
    }
}
