//! Benchmark utilities for the compact-block relay workspace.
pub mod utils {
    use relay_types::{Block, BlockHeader, Transaction, TxInput, TxOutput};

    pub fn generate_random_hash() -> [u8; 32] {
        use rand::Rng;
        let mut hash = [0u8; 32];
        rand::thread_rng().fill(&mut hash);
        hash
    }

    /// Deterministic transaction with a unique identity per seed.
    pub fn seeded_tx(seed: u32) -> Transaction {
        let mut prev_txid = [0u8; 32];
        prev_txid[..4].copy_from_slice(&seed.to_le_bytes());
        Transaction {
            version: 1,
            inputs: vec![TxInput {
                prev_txid,
                prev_vout: seed,
                script: vec![0x51; 8],
                sequence: u32::MAX,
            }],
            outputs: vec![TxOutput {
                amount: 1_000 + u64::from(seed),
                script: vec![0x76; 25],
            }],
            lock_time: 0,
        }
    }

    /// A block of `tx_count` transactions, coinbase first.
    pub fn seeded_block(tx_count: usize) -> Block {
        let mut transactions = vec![Transaction::coinbase(b"bench", 50_000, vec![0x51])];
        for seed in 1..tx_count {
            transactions.push(seeded_tx(seed as u32));
        }
        Block {
            header: BlockHeader {
                version: 2,
                prev_block: [0x55; 32],
                merkle_root: [0x66; 32],
                timestamp: 1_700_000_000,
                bits: 0x1d00_ffff,
                nonce: 42,
            },
            transactions,
        }
    }
}
