//! # Chain Primitives
//!
//! Block and transaction records shared by the relay crates.
//!
//! ## Clusters
//!
//! - **Identity**: `Hash`, `BlockHash`, `TxHash`
//! - **Chain**: `BlockHeader`, `Transaction`, `Block`
//!
//! The wire forms here are fixed external formats; every consumer of the
//! relay protocol must produce identical bytes.

use serde::{Deserialize, Serialize};

use crate::hashing::sha256d;
use crate::wire::{ByteReader, ByteWriter, DecodeError, WireDecode, WireEncode};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte hash.
pub type Hash = [u8; 32];

/// Identifies a block by the double SHA-256 of its header.
pub type BlockHash = Hash;

/// Identifies a transaction by the double SHA-256 of its serialization.
pub type TxHash = Hash;

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// Fixed 80-byte block header.
///
/// Serialized layout: version u32 LE, prev_block 32B, merkle_root 32B,
/// timestamp u32 LE, bits u32 LE, nonce u32 LE.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Protocol version for this block.
    pub version: u32,
    /// Hash of the parent block (chain linkage).
    pub prev_block: BlockHash,
    /// Merkle root over the block's transactions.
    pub merkle_root: Hash,
    /// Unix timestamp (seconds since epoch).
    pub timestamp: u32,
    /// Compact difficulty target. Zero only in a default-constructed header.
    pub bits: u32,
    /// Proof-of-work nonce.
    pub nonce: u32,
}

impl BlockHeader {
    /// Serialized size of every header.
    pub const SERIALIZED_LEN: usize = 80;

    /// True for a header that was never populated.
    ///
    /// A mined header always carries a non-zero difficulty target.
    pub fn is_null(&self) -> bool {
        self.bits == 0
    }

    /// Double SHA-256 of the 80-byte serialization.
    pub fn hash(&self) -> BlockHash {
        sha256d(&self.to_bytes())
    }
}

impl WireEncode for BlockHeader {
    fn encode(&self, w: &mut ByteWriter) {
        w.put_u32_le(self.version);
        w.put_bytes(&self.prev_block);
        w.put_bytes(&self.merkle_root);
        w.put_u32_le(self.timestamp);
        w.put_u32_le(self.bits);
        w.put_u32_le(self.nonce);
    }
}

impl WireDecode for BlockHeader {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            version: r.read_u32_le()?,
            prev_block: r.read_array()?,
            merkle_root: r.read_array()?,
            timestamp: r.read_u32_le()?,
            bits: r.read_u32_le()?,
            nonce: r.read_u32_le()?,
        })
    }
}

/// Reference to a previous transaction output being spent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Hash of the transaction holding the spent output.
    pub prev_txid: TxHash,
    /// Output position inside that transaction.
    pub prev_vout: u32,
    /// Unlocking script.
    pub script: Vec<u8>,
    /// Relative-locktime / replacement sequence field.
    pub sequence: u32,
}

/// Value sent to a locking script.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Amount in base units.
    pub amount: u64,
    /// Locking script.
    pub script: Vec<u8>,
}

/// A transaction: variable-layout record identified by its wire hash.
///
/// ```text
/// version    u32 LE
/// inputs     varint count, then (prev_txid, prev_vout, script, sequence) each
/// outputs    varint count, then (amount, script) each
/// lock_time  u32 LE
/// ```
///
/// The minimal expressible transaction (one input and one output, both with
/// empty scripts) serializes to exactly 60 bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
}

impl Transaction {
    /// True for a transaction that was never populated.
    pub fn is_null(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    /// Double SHA-256 of the serialization.
    pub fn hash(&self) -> TxHash {
        sha256d(&self.to_bytes())
    }

    /// Builds a coinbase-shaped transaction: a single input spending the
    /// null outpoint, carrying arbitrary script bytes (height tag, extra
    /// nonce), paying `reward` to `script`.
    pub fn coinbase(tag: &[u8], reward: u64, script: Vec<u8>) -> Self {
        Self {
            version: 1,
            inputs: vec![TxInput {
                prev_txid: [0u8; 32],
                prev_vout: u32::MAX,
                script: tag.to_vec(),
                sequence: u32::MAX,
            }],
            outputs: vec![TxOutput {
                amount: reward,
                script,
            }],
            lock_time: 0,
        }
    }
}

impl WireEncode for Transaction {
    fn encode(&self, w: &mut ByteWriter) {
        w.put_u32_le(self.version);
        w.put_varint(self.inputs.len() as u64);
        for input in &self.inputs {
            w.put_bytes(&input.prev_txid);
            w.put_u32_le(input.prev_vout);
            w.put_varint(input.script.len() as u64);
            w.put_bytes(&input.script);
            w.put_u32_le(input.sequence);
        }
        w.put_varint(self.outputs.len() as u64);
        for output in &self.outputs {
            w.put_u64_le(output.amount);
            w.put_varint(output.script.len() as u64);
            w.put_bytes(&output.script);
        }
        w.put_u32_le(self.lock_time);
    }
}

impl WireDecode for Transaction {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let version = r.read_u32_le()?;

        let input_count = r.read_varint()?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            let prev_txid = r.read_array()?;
            let prev_vout = r.read_u32_le()?;
            let script_len = read_script_len(r)?;
            let script = r.read_bytes(script_len)?.to_vec();
            let sequence = r.read_u32_le()?;
            inputs.push(TxInput {
                prev_txid,
                prev_vout,
                script,
                sequence,
            });
        }

        let output_count = r.read_varint()?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            let amount = r.read_u64_le()?;
            let script_len = read_script_len(r)?;
            let script = r.read_bytes(script_len)?.to_vec();
            outputs.push(TxOutput { amount, script });
        }

        let lock_time = r.read_u32_le()?;
        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }
}

/// Scripts can never outgrow a block; rejecting earlier keeps a hostile
/// length from forcing a giant allocation before its bytes are read.
fn read_script_len(r: &mut ByteReader<'_>) -> Result<usize, DecodeError> {
    const MAX_SCRIPT_LEN: u64 = 1_000_000;
    let len = r.read_varint()?;
    if len > MAX_SCRIPT_LEN {
        return Err(DecodeError::OversizedLength {
            len,
            max: MAX_SCRIPT_LEN,
        });
    }
    Ok(len as usize)
}

/// A full block: header plus ordered transactions, coinbase first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The block's identity is its header hash.
    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

impl WireEncode for Block {
    fn encode(&self, w: &mut ByteWriter) {
        self.header.encode(w);
        w.put_varint(self.transactions.len() as u64);
        for tx in &self.transactions {
            tx.encode(w);
        }
    }
}

impl WireDecode for Block {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let header = BlockHeader::decode(r)?;
        let count = r.read_varint()?;
        let mut transactions = Vec::new();
        for _ in 0..count {
            transactions.push(Transaction::decode(r)?);
        }
        Ok(Self {
            header,
            transactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> BlockHeader {
        BlockHeader {
            version: 2,
            prev_block: [0x11; 32],
            merkle_root: [0x22; 32],
            timestamp: 1_700_000_000,
            bits: 0x1d00_ffff,
            nonce: 0x0123_4567,
        }
    }

    fn sample_tx(seed: u8) -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TxInput {
                prev_txid: [seed; 32],
                prev_vout: u32::from(seed),
                script: vec![0x51, seed],
                sequence: u32::MAX,
            }],
            outputs: vec![TxOutput {
                amount: 50_000 + u64::from(seed),
                script: vec![0x76, 0xa9, seed],
            }],
            lock_time: 0,
        }
    }

    #[test]
    fn test_header_serializes_to_80_bytes() {
        assert_eq!(
            sample_header().to_bytes().len(),
            BlockHeader::SERIALIZED_LEN
        );
    }

    #[test]
    fn test_header_round_trip() {
        let header = sample_header();
        let decoded = BlockHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.hash(), header.hash());
    }

    #[test]
    fn test_default_header_is_null() {
        assert!(BlockHeader::default().is_null());
        assert!(!sample_header().is_null());
    }

    #[test]
    fn test_transaction_round_trip() {
        let tx = sample_tx(0xAB);
        let decoded = Transaction::from_bytes(&tx.to_bytes()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.hash(), tx.hash());
    }

    #[test]
    fn test_minimal_transaction_is_60_bytes() {
        let tx = Transaction {
            version: 1,
            inputs: vec![TxInput {
                prev_txid: [0; 32],
                prev_vout: 0,
                script: Vec::new(),
                sequence: 0,
            }],
            outputs: vec![TxOutput {
                amount: 0,
                script: Vec::new(),
            }],
            lock_time: 0,
        };
        assert_eq!(tx.to_bytes().len(), 60);
    }

    #[test]
    fn test_default_transaction_is_null() {
        assert!(Transaction::default().is_null());
        assert!(!sample_tx(1).is_null());
        assert!(!Transaction::coinbase(b"h:1", 5_000, vec![0x51]).is_null());
    }

    #[test]
    fn test_coinbase_spends_null_outpoint() {
        let cb = Transaction::coinbase(b"height:100", 25_000, vec![0xAA]);
        assert_eq!(cb.inputs.len(), 1);
        assert_eq!(cb.inputs[0].prev_txid, [0u8; 32]);
        assert_eq!(cb.inputs[0].prev_vout, u32::MAX);
    }

    #[test]
    fn test_transaction_rejects_oversized_script() {
        let mut w = ByteWriter::new();
        w.put_u32_le(1); // version
        w.put_varint(1); // one input
        w.put_bytes(&[0u8; 32]);
        w.put_u32_le(0);
        w.put_varint(u64::MAX); // hostile script length
        let result = Transaction::from_bytes(w.as_slice());
        assert!(matches!(
            result,
            Err(DecodeError::OversizedLength { .. })
        ));
    }

    #[test]
    fn test_block_round_trip() {
        let block = Block {
            header: sample_header(),
            transactions: vec![
                Transaction::coinbase(b"h:9", 50_000, vec![0x51]),
                sample_tx(1),
                sample_tx(2),
            ],
        };
        let decoded = Block::from_bytes(&block.to_bytes()).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.hash(), block.header.hash());
    }

    #[test]
    fn test_truncated_block_rejected() {
        let block = Block {
            header: sample_header(),
            transactions: vec![sample_tx(1)],
        };
        let bytes = block.to_bytes();
        let result = Block::from_bytes(&bytes[..bytes.len() - 3]);
        assert!(matches!(result, Err(DecodeError::UnexpectedEnd { .. })));
    }
}
