//! # SHA-256 Hashing
//!
//! One-shot digest helpers over the `sha2` crate.
//!
//! Entity identity hashes (headers, transactions) use double SHA-256; the
//! short-ID selector uses a single pass.

use sha2::{Digest, Sha256};

use crate::entities::Hash;

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Hash multiple inputs as one SHA-256 stream.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Double SHA-256.
pub fn sha256d(data: &[u8]) -> Hash {
    sha256(&sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_deterministic() {
        assert_eq!(sha256(b"test"), sha256(b"test"));
        assert_ne!(sha256(b"test"), sha256(b"Test"));
    }

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of the empty string.
        let expected: [u8; 32] = [
            0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f,
            0xb9, 0x24, 0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95, 0x99, 0x1b,
            0x78, 0x52, 0xb8, 0x55,
        ];
        assert_eq!(sha256(b""), expected);
    }

    #[test]
    fn test_sha256_many_matches_concatenation() {
        let split = sha256_many(&[b"hello ", b"world"]);
        let whole = sha256(b"hello world");
        assert_eq!(split, whole);
    }

    #[test]
    fn test_sha256d_is_double_hash() {
        let once = sha256(b"payload");
        assert_eq!(sha256d(b"payload"), sha256(&once));
    }
}
