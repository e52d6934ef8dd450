//! Outbound (driven) ports for the compact-block relay subsystem.
//!
//! The relay core never owns a mempool; it consumes one through
//! [`MempoolView`]. The contract is reference-counted retention: a pinned
//! entry stays resolvable until its last pin is released, even if the pool
//! evicts it in the meantime. [`InMemoryMempool`] is the reference
//! implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use relay_types::{Transaction, TxHash};

/// Read view over a transaction pool with pin-based retention.
///
/// Reconstruction holds entries across the gap between scanning the pool and
/// receiving the peer's missing-transaction response, so the pool cannot hand
/// out borrows into its storage; retention is expressed as a pin count
/// instead.
pub trait MempoolView: Send + Sync {
    /// Iterates every live entry under the pool's shared read view.
    ///
    /// The view is held for exactly the duration of the call. `pin` and
    /// `lookup` must be callable from inside the callback; `unpin` need not
    /// be.
    fn for_each_entry(&self, f: &mut dyn FnMut(&TxHash, &Transaction));

    /// Takes one retention reference on an entry.
    ///
    /// Returns false when the entry is no longer present, in which case no
    /// reference was taken.
    fn pin(&self, tx_hash: &TxHash) -> bool;

    /// Releases one retention reference taken by [`Self::pin`].
    fn unpin(&self, tx_hash: &TxHash);

    /// Resolves a transaction. Succeeds for every entry whose pin count is
    /// above zero, and for any live entry.
    fn lookup(&self, tx_hash: &TxHash) -> Option<Transaction>;
}

struct PoolEntry {
    tx: Transaction,
    pins: AtomicU32,
    /// Set when the pool evicted the entry while pins were outstanding; the
    /// entry is hidden from iteration and deleted on the last unpin.
    evicted: bool,
}

/// Hash-indexed transaction pool with reference-counted retention.
#[derive(Default)]
pub struct InMemoryMempool {
    entries: RwLock<HashMap<TxHash, PoolEntry>>,
}

impl InMemoryMempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a transaction, returning its hash. Re-inserting an existing
    /// transaction is a no-op.
    pub fn insert(&self, tx: Transaction) -> TxHash {
        let tx_hash = tx.hash();
        self.entries.write().entry(tx_hash).or_insert(PoolEntry {
            tx,
            pins: AtomicU32::new(0),
            evicted: false,
        });
        tx_hash
    }

    /// Removes an entry from the live set.
    ///
    /// An entry with outstanding pins is only hidden; its storage survives
    /// until the last pin is released. Returns false for an unknown hash.
    pub fn evict(&self, tx_hash: &TxHash) -> bool {
        let mut entries = self.entries.write();
        let Some(entry) = entries.get_mut(tx_hash) else {
            return false;
        };
        if entry.evicted {
            return false;
        }
        if *entry.pins.get_mut() == 0 {
            entries.remove(tx_hash);
        } else {
            entry.evicted = true;
        }
        true
    }

    /// Number of live (non-evicted) entries.
    pub fn len(&self) -> usize {
        self.entries.read().values().filter(|e| !e.evicted).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the pool still stores an entry, live or pinned-after-evict.
    pub fn contains(&self, tx_hash: &TxHash) -> bool {
        self.entries.read().contains_key(tx_hash)
    }

    /// Outstanding pins on an entry (0 for unknown hashes).
    pub fn pin_count(&self, tx_hash: &TxHash) -> u32 {
        self.entries
            .read()
            .get(tx_hash)
            .map(|e| e.pins.load(Ordering::Acquire))
            .unwrap_or(0)
    }
}

impl MempoolView for InMemoryMempool {
    fn for_each_entry(&self, f: &mut dyn FnMut(&TxHash, &Transaction)) {
        let entries = self.entries.read();
        for (tx_hash, entry) in entries.iter() {
            if !entry.evicted {
                f(tx_hash, &entry.tx);
            }
        }
    }

    fn pin(&self, tx_hash: &TxHash) -> bool {
        // Recursive read: pin runs inside for_each_entry callbacks, and a
        // plain read could deadlock behind a queued writer.
        let entries = self.entries.read_recursive();
        match entries.get(tx_hash) {
            Some(entry) if !entry.evicted => {
                entry.pins.fetch_add(1, Ordering::AcqRel);
                true
            }
            _ => false,
        }
    }

    fn unpin(&self, tx_hash: &TxHash) {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(tx_hash) {
            let pins = entry.pins.get_mut();
            *pins = pins.saturating_sub(1);
            if *pins == 0 && entry.evicted {
                entries.remove(tx_hash);
            }
        }
    }

    fn lookup(&self, tx_hash: &TxHash) -> Option<Transaction> {
        self.entries
            .read_recursive()
            .get(tx_hash)
            .map(|entry| entry.tx.clone())
    }
}
