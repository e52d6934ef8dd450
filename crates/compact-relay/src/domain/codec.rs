//! # Relay Message Codecs
//!
//! Exact wire forms for [`CompactAnnouncement`], [`MissingRequest`] and
//! [`MissingResponse`].
//!
//! ## Announcement layout
//!
//! ```text
//! header      80-byte fixed form
//! nonce       u64 LE
//! short_ids   varint count, then count x 6-byte LE fingerprints
//! prefilled   varint count, then count x { varint index gap; transaction }
//! ```
//!
//! ## Differential indexes
//!
//! Ascending index sequences (prefilled slots, missing-request indexes) store
//! the first value verbatim and each later value as `current - previous - 1`.
//! Decoding restores the running sum and rejects overflow, so decoded
//! sequences are strictly ascending by construction.
//!
//! ## Hostile inputs
//!
//! Decoders never trust a declared count: the transaction total is capped by
//! the consensus block-size ceiling over the minimum transaction size, and
//! vectors grow in [`DECODE_CHUNK`] steps interleaved with reads, so a 5-byte
//! varint cannot induce a gigabyte allocation.

use relay_types::wire::{ByteReader, ByteWriter, WireDecode, WireEncode};
use relay_types::{BlockHeader, Transaction};
use tracing::trace;

use super::entities::{CompactAnnouncement, MissingRequest, MissingResponse, PrefilledTransaction};
use crate::error::RelayError;

/// Consensus ceiling on a serialized block.
pub const MAX_BLOCK_SIZE: usize = 1_000_000;

/// Smallest transaction the wire format can express.
pub const MIN_TRANSACTION_SIZE: usize = 60;

/// Most transactions any block, and therefore any announcement, can hold.
pub const MAX_ANNOUNCED_TXN: usize = MAX_BLOCK_SIZE / MIN_TRANSACTION_SIZE;

/// Decode-side vector growth step for untrusted counts.
const DECODE_CHUNK: usize = 1_000;

impl WireEncode for CompactAnnouncement {
    fn encode(&self, w: &mut ByteWriter) {
        self.header.encode(w);
        w.put_u64_le(self.nonce());

        w.put_varint(self.short_ids().len() as u64);
        for &id in self.short_ids() {
            w.put_short_id(id);
        }

        w.put_varint(self.prefilled().len() as u64);
        let mut prev: Option<u16> = None;
        for p in self.prefilled() {
            let gap = match prev {
                None => p.index,
                Some(prev) => p.index - prev - 1,
            };
            w.put_varint(u64::from(gap));
            p.tx.encode(w);
            prev = Some(p.index);
        }
    }
}

impl CompactAnnouncement {
    /// Decodes one announcement from the cursor, recomputing the selector.
    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self, RelayError> {
        let header = BlockHeader::decode(r)?;
        let nonce = r.read_u64_le()?;

        let short_id_count = r.read_varint()?;
        check_announced_count(short_id_count)?;
        let mut short_ids = Vec::new();
        while short_ids.len() < short_id_count as usize {
            let target = usize::min(short_ids.len() + DECODE_CHUNK, short_id_count as usize);
            short_ids.reserve(target - short_ids.len());
            while short_ids.len() < target {
                short_ids.push(r.read_short_id()?);
            }
        }

        let prefilled_count = r.read_varint()?;
        check_announced_count(short_id_count.saturating_add(prefilled_count))?;
        let mut prefilled = Vec::new();
        let mut next_index: u64 = 0;
        while prefilled.len() < prefilled_count as usize {
            let target = usize::min(prefilled.len() + DECODE_CHUNK, prefilled_count as usize);
            prefilled.reserve(target - prefilled.len());
            while prefilled.len() < target {
                let index = next_index.saturating_add(r.read_varint()?);
                if index > u64::from(u16::MAX) {
                    trace!(index, "rejecting announcement: prefilled index overflow");
                    return Err(RelayError::PrefilledIndexOverflow);
                }
                let tx = Transaction::decode(r)?;
                prefilled.push(PrefilledTransaction {
                    index: index as u16,
                    tx,
                });
                next_index = index + 1;
            }
        }

        Ok(Self::from_parts(header, nonce, short_ids, prefilled))
    }

    /// Decodes an announcement that must span the whole input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RelayError> {
        whole_input(bytes, Self::decode)
    }
}

fn check_announced_count(count: u64) -> Result<(), RelayError> {
    if count > MAX_ANNOUNCED_TXN as u64 {
        trace!(
            count,
            max = MAX_ANNOUNCED_TXN,
            "rejecting announcement: transaction count exceeds relay bound"
        );
        return Err(RelayError::TooManyTransactions {
            count,
            max: MAX_ANNOUNCED_TXN as u64,
        });
    }
    Ok(())
}

impl WireEncode for MissingRequest {
    fn encode(&self, w: &mut ByteWriter) {
        w.put_bytes(&self.block_hash);
        w.put_varint(self.indexes.len() as u64);
        let mut prev: Option<u32> = None;
        for &index in &self.indexes {
            let gap = match prev {
                None => index,
                Some(prev) => index - prev - 1,
            };
            w.put_varint(u64::from(gap));
            prev = Some(index);
        }
    }
}

impl MissingRequest {
    /// Decodes one request from the cursor, restoring absolute indexes.
    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self, RelayError> {
        let block_hash = r.read_array()?;

        let count = r.read_varint()?;
        let mut indexes = Vec::new();
        let mut next_index: u64 = 0;
        while (indexes.len() as u64) < count {
            let target = u64::min(indexes.len() as u64 + DECODE_CHUNK as u64, count) as usize;
            indexes.reserve(target - indexes.len());
            while indexes.len() < target {
                let index = next_index.saturating_add(r.read_varint()?);
                if index > u64::from(u32::MAX) {
                    trace!(index, "rejecting request: index overflow");
                    return Err(RelayError::RequestIndexOverflow);
                }
                indexes.push(index as u32);
                next_index = index + 1;
            }
        }

        Ok(Self {
            block_hash,
            indexes,
        })
    }

    /// Decodes a request that must span the whole input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RelayError> {
        whole_input(bytes, Self::decode)
    }
}

impl WireEncode for MissingResponse {
    fn encode(&self, w: &mut ByteWriter) {
        w.put_bytes(&self.block_hash);
        w.put_varint(self.transactions.len() as u64);
        for tx in &self.transactions {
            tx.encode(w);
        }
    }
}

impl MissingResponse {
    /// Decodes one response from the cursor.
    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self, RelayError> {
        let block_hash = r.read_array()?;

        let count = r.read_varint()?;
        let mut transactions = Vec::new();
        while (transactions.len() as u64) < count {
            let target = u64::min(transactions.len() as u64 + DECODE_CHUNK as u64, count) as usize;
            transactions.reserve(target - transactions.len());
            while transactions.len() < target {
                transactions.push(Transaction::decode(r)?);
            }
        }

        Ok(Self {
            block_hash,
            transactions,
        })
    }

    /// Decodes a response that must span the whole input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RelayError> {
        whole_input(bytes, Self::decode)
    }
}

fn whole_input<T>(
    bytes: &[u8],
    decode: impl FnOnce(&mut ByteReader<'_>) -> Result<T, RelayError>,
) -> Result<T, RelayError> {
    let mut r = ByteReader::new(bytes);
    let value = decode(&mut r)?;
    if !r.is_empty() {
        return Err(relay_types::wire::DecodeError::TrailingBytes(r.remaining()).into());
    }
    Ok(value)
}
