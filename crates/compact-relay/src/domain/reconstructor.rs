//! # Partial-Block Reconstruction
//!
//! Turns a [`CompactAnnouncement`] plus the local mempool into a full block.
//!
//! ## State Machine
//!
//! ```text
//! EMPTY ──init(ann)──► INITIALIZED ──fill(missing)──► FILLED ──drop──► RELEASED
//!                           │
//!                           └─────────────drop───────────────► RELEASED
//! ```
//!
//! `init` pins every mempool entry it matches so the entry survives eviction
//! while the reconstruction waits for the peer's missing-transaction
//! response. Dropping the reconstructor at any point releases exactly the
//! pins that were taken; an `init` that failed took none.

use std::collections::HashMap;
use std::sync::Arc;

use relay_types::{Block, BlockHeader, Transaction, TxHash};
use tracing::debug;

use super::codec::MAX_ANNOUNCED_TXN;
use super::entities::{CompactAnnouncement, MissingRequest, PrefilledTransaction};
use crate::error::RelayError;
use crate::ports::outbound::MempoolView;

/// Reconstructs one announced block against a mempool view.
///
/// Owned by a single logical task; not for concurrent mutation. Many
/// reconstructors may run against the same pool at once.
pub struct BlockReconstructor<M: MempoolView> {
    pool: Arc<M>,
    /// `Some` once `init` succeeded.
    header: Option<BlockHeader>,
    /// One slot per block transaction; `Some` when the hash is known.
    tx_hashes: Vec<Option<TxHash>>,
    /// Prefilled transactions with absolute ascending indexes.
    prefilled: Vec<PrefilledTransaction>,
    /// Hashes whose mempool pins this reconstructor holds.
    pinned: Vec<TxHash>,
}

impl<M: MempoolView> BlockReconstructor<M> {
    /// Creates an empty reconstructor bound to `pool`.
    pub fn new(pool: Arc<M>) -> Self {
        Self {
            pool,
            header: None,
            tx_hashes: Vec::new(),
            prefilled: Vec::new(),
            pinned: Vec::new(),
        }
    }

    /// Consumes an announcement: validates it, resolves what the mempool
    /// already holds, and pins those entries.
    ///
    /// # Errors
    ///
    /// - `Invalid`-kind errors for a null header, an empty announcement, a
    ///   transaction count past the relay bound, a null prefill, or a
    ///   prefill claiming a slot no short ID / prefill combination reaches.
    /// - [`RelayError::ShortIdCollision`] (`Failed` kind) when two short IDs
    ///   inside the announcement collide; the peer may retry under a fresh
    ///   nonce.
    ///
    /// No pin is taken on any error path.
    ///
    /// # Panics
    ///
    /// Panics when called twice on the same reconstructor.
    pub fn init(&mut self, announcement: &CompactAnnouncement) -> Result<(), RelayError> {
        assert!(
            self.header.is_none() && self.tx_hashes.is_empty(),
            "reconstructor already initialized"
        );

        if announcement.header.is_null() {
            return Err(RelayError::NullHeader);
        }
        if announcement.short_ids().is_empty() && announcement.prefilled().is_empty() {
            return Err(RelayError::EmptyAnnouncement);
        }
        let total = announcement.tx_count();
        if total > MAX_ANNOUNCED_TXN {
            return Err(RelayError::TooManyTransactions {
                count: total as u64,
                max: MAX_ANNOUNCED_TXN as u64,
            });
        }

        let short_ids = announcement.short_ids();
        let mut tx_hashes: Vec<Option<TxHash>> = vec![None; total];

        let mut prefilled = Vec::with_capacity(announcement.prefilled().len());
        for (position, p) in announcement.prefilled().iter().enumerate() {
            if p.tx.is_null() {
                return Err(RelayError::NullPrefilled { position });
            }
            // With `position` earlier prefills placed, the highest slot any
            // combination of short IDs and prefills reaches is
            // short_ids.len() + position.
            if usize::from(p.index) > short_ids.len() + position {
                return Err(RelayError::UnreachablePrefill {
                    position,
                    index: p.index,
                });
            }
            tx_hashes[usize::from(p.index)] = Some(p.tx.hash());
            prefilled.push(p.clone());
        }

        // Map each short ID to its slot, skipping over prefilled slots.
        let mut slots: HashMap<u64, usize> = HashMap::with_capacity(short_ids.len());
        let mut index_offset = 0usize;
        let mut prefill_iter = prefilled.iter().peekable();
        for (i, &id) in short_ids.iter().enumerate() {
            while prefill_iter
                .next_if(|p| usize::from(p.index) == i + index_offset)
                .is_some()
            {
                index_offset += 1;
            }
            slots.insert(id, i + index_offset);
        }
        if slots.len() != short_ids.len() {
            // Two announced fingerprints collided; only a fresh nonce helps.
            return Err(RelayError::ShortIdCollision);
        }

        // Resolve against the mempool under its read view, pinning each hit.
        // Distinct pool entries can share a fingerprint; the first one seen
        // wins and the response/validation path catches a wrong winner.
        let selector = announcement.selector();
        let pool = self.pool.as_ref();
        let mut pinned: Vec<TxHash> = Vec::new();
        pool.for_each_entry(&mut |tx_hash, _tx| {
            if slots.is_empty() {
                return;
            }
            let id = selector.short_id(tx_hash);
            if let Some(&slot) = slots.get(&id) {
                if pool.pin(tx_hash) {
                    tx_hashes[slot] = Some(*tx_hash);
                    pinned.push(*tx_hash);
                    slots.remove(&id);
                }
            }
        });

        let hits = pinned.len();
        self.header = Some(announcement.header);
        self.tx_hashes = tx_hashes;
        self.prefilled = prefilled;
        self.pinned = pinned;

        debug!(
            slots = total,
            prefilled = self.prefilled.len(),
            mempool_hits = hits,
            missing = total - self.prefilled.len() - hits,
            "initialized block reconstruction"
        );
        Ok(())
    }

    /// Total transaction slots in the announced block.
    pub fn tx_count(&self) -> usize {
        self.tx_hashes.len()
    }

    /// Whether the transaction at `index` is already resolvable locally.
    ///
    /// # Panics
    ///
    /// Panics before `init` or for an out-of-range index.
    pub fn is_tx_available(&self, index: usize) -> bool {
        assert!(self.header.is_some(), "reconstructor not initialized");
        assert!(index < self.tx_hashes.len(), "slot index out of range");
        self.tx_hashes[index].is_some()
    }

    /// Slots with no local transaction, in ascending order.
    pub fn missing_indexes(&self) -> Vec<u32> {
        self.tx_hashes
            .iter()
            .enumerate()
            .filter_map(|(i, hash)| hash.is_none().then_some(i as u32))
            .collect()
    }

    /// The request asking a peer for every unresolved slot.
    ///
    /// # Panics
    ///
    /// Panics before `init`.
    pub fn missing_request(&self) -> MissingRequest {
        let header = self.header.as_ref().expect("reconstructor not initialized");
        MissingRequest::new(header.hash(), self.missing_indexes())
    }

    /// Assembles the full block, consuming `missing` for the unresolved
    /// slots in ascending order.
    ///
    /// # Errors
    ///
    /// `Invalid`-kind errors when `missing` runs out before every slot is
    /// filled, or when entries remain after the last slot.
    ///
    /// # Panics
    ///
    /// Panics before `init`, or if a pinned mempool entry can no longer be
    /// resolved (the retention contract was broken).
    pub fn fill(&self, missing: &[Transaction]) -> Result<Block, RelayError> {
        let header = self.header.as_ref().expect("reconstructor not initialized");

        let mut transactions = Vec::with_capacity(self.tx_hashes.len());
        let mut missing_iter = missing.iter();
        let mut used = 0usize;
        let mut prefill_iter = self.prefilled.iter().peekable();
        for (slot, hash) in self.tx_hashes.iter().enumerate() {
            match hash {
                None => {
                    let tx = missing_iter
                        .next()
                        .ok_or(RelayError::MissingTransactionsExhausted { slot })?;
                    used += 1;
                    transactions.push(tx.clone());
                }
                Some(tx_hash) => {
                    if let Some(p) = prefill_iter.next_if(|p| usize::from(p.index) == slot) {
                        transactions.push(p.tx.clone());
                    } else {
                        let tx = self
                            .pool
                            .lookup(tx_hash)
                            .expect("pinned mempool entry must stay resolvable");
                        transactions.push(tx);
                    }
                }
            }
        }
        if used < missing.len() {
            return Err(RelayError::UnusedMissingTransactions {
                extra: missing.len() - used,
            });
        }

        debug!(
            slots = transactions.len(),
            from_peer = used,
            "filled block reconstruction"
        );
        Ok(Block {
            header: *header,
            transactions,
        })
    }
}

impl<M: MempoolView> Drop for BlockReconstructor<M> {
    fn drop(&mut self) {
        // Release exactly the pins init took, in any order.
        for tx_hash in &self.pinned {
            self.pool.unpin(tx_hash);
        }
    }
}
