//! # Relay Wire Entities
//!
//! The three messages this subsystem exchanges with peers:
//!
//! - [`CompactAnnouncement`]: header + nonce + short IDs + prefilled
//!   transactions (the compressed form of a freshly mined block)
//! - [`MissingRequest`]: indexes the receiver could not resolve locally
//! - [`MissingResponse`]: the transactions answering such a request
//!
//! Announcements are immutable once built, whether from a block (producer
//! side) or from decoded bytes (consumer side); the derived
//! [`ShortIdSelector`] is computed at construction and cached.
//!
//! Reference: BIP152 (Compact Block Relay).

use rand::Rng;
use relay_types::{Block, BlockHash, BlockHeader, Transaction};

use super::short_id::{ShortId, ShortIdSelector};

/// A transaction shipped in full inside an announcement.
///
/// The coinbase is always prefilled (the receiver can never have it);
/// producers may prefill other transactions they expect receivers to lack.
/// The index is absolute in memory; the wire form stores gaps (see the codec).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefilledTransaction {
    /// Position in the block's transaction list.
    pub index: u16,
    /// The full transaction.
    pub tx: Transaction,
}

/// Compressed block announcement: header, fingerprint nonce, short IDs for
/// transactions the receiver likely has, full copies of the rest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactAnnouncement {
    /// Header of the announced block.
    pub header: BlockHeader,
    nonce: u64,
    short_ids: Vec<ShortId>,
    prefilled: Vec<PrefilledTransaction>,
    selector: ShortIdSelector,
}

impl CompactAnnouncement {
    /// Builds an announcement for `block` under a fresh random nonce.
    ///
    /// The coinbase is the single prefilled transaction; every other
    /// transaction is represented by its short ID.
    pub fn from_block(block: &Block) -> Self {
        Self::from_block_with_nonce(block, rand::thread_rng().gen())
    }

    /// Builds an announcement under a caller-chosen nonce.
    ///
    /// Deterministic; producers normally use [`Self::from_block`].
    pub fn from_block_with_nonce(block: &Block, nonce: u64) -> Self {
        Self::build(block, nonce, &[])
    }

    /// Builds an announcement that also prefills `extra_indexes`
    /// (transactions the producer believes receivers are missing).
    ///
    /// Index 0 is always prefilled regardless of the argument.
    pub fn from_block_with_prefilled(block: &Block, extra_indexes: &[usize]) -> Self {
        Self::build(block, rand::thread_rng().gen(), extra_indexes)
    }

    fn build(block: &Block, nonce: u64, extra_indexes: &[usize]) -> Self {
        let selector = ShortIdSelector::derive(&block.header, nonce);

        let mut prefill_flags = vec![false; block.transactions.len()];
        if !prefill_flags.is_empty() {
            prefill_flags[0] = true;
        }
        for &index in extra_indexes {
            if index < prefill_flags.len() {
                prefill_flags[index] = true;
            }
        }

        let mut short_ids = Vec::new();
        let mut prefilled = Vec::new();
        for (index, tx) in block.transactions.iter().enumerate() {
            if prefill_flags[index] {
                prefilled.push(PrefilledTransaction {
                    index: index as u16,
                    tx: tx.clone(),
                });
            } else {
                short_ids.push(selector.short_id(&tx.hash()));
            }
        }

        Self {
            header: block.header,
            nonce,
            short_ids,
            prefilled,
            selector,
        }
    }

    /// Assembles an announcement from decoded parts, recomputing the selector.
    ///
    /// `prefilled` must hold absolute, strictly ascending indexes; the codec
    /// guarantees this when restoring the differential wire form.
    pub(crate) fn from_parts(
        header: BlockHeader,
        nonce: u64,
        short_ids: Vec<ShortId>,
        prefilled: Vec<PrefilledTransaction>,
    ) -> Self {
        let selector = ShortIdSelector::derive(&header, nonce);
        Self {
            header,
            nonce,
            short_ids,
            prefilled,
            selector,
        }
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Short IDs in block order (prefilled slots excluded).
    pub fn short_ids(&self) -> &[ShortId] {
        &self.short_ids
    }

    /// Prefilled transactions in ascending index order.
    pub fn prefilled(&self) -> &[PrefilledTransaction] {
        &self.prefilled
    }

    /// The cached fingerprint function for this announcement.
    pub fn selector(&self) -> &ShortIdSelector {
        &self.selector
    }

    /// Total transactions in the announced block.
    pub fn tx_count(&self) -> usize {
        self.short_ids.len() + self.prefilled.len()
    }
}

/// Request for the transactions a reconstruction could not resolve locally.
///
/// Indexes are strictly ascending; the wire form stores gaps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingRequest {
    /// Hash of the block being reconstructed.
    pub block_hash: BlockHash,
    /// Absolute transaction indexes, strictly ascending.
    pub indexes: Vec<u32>,
}

impl MissingRequest {
    pub fn new(block_hash: BlockHash, indexes: Vec<u32>) -> Self {
        Self {
            block_hash,
            indexes,
        }
    }
}

/// Response carrying the transactions named by a [`MissingRequest`],
/// in request order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingResponse {
    /// Hash of the block these transactions belong to.
    pub block_hash: BlockHash,
    /// Requested transactions, in the order their indexes were requested.
    pub transactions: Vec<Transaction>,
}

impl MissingResponse {
    pub fn new(block_hash: BlockHash, transactions: Vec<Transaction>) -> Self {
        Self {
            block_hash,
            transactions,
        }
    }

    /// Answers `request` out of the producer's copy of the block.
    ///
    /// Returns `None` when the request names an index past the end of the
    /// block, which an honest peer never does.
    pub fn for_request(request: &MissingRequest, block: &Block) -> Option<Self> {
        let mut transactions = Vec::with_capacity(request.indexes.len());
        for &index in &request.indexes {
            transactions.push(block.transactions.get(index as usize)?.clone());
        }
        Some(Self {
            block_hash: request.block_hash,
            transactions,
        })
    }
}
