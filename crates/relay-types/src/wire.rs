//! # Wire Byte Codec
//!
//! Cursor-based reader/writer pair for the peer-to-peer serialization format,
//! plus the [`WireEncode`] / [`WireDecode`] traits every wire object
//! implements.
//!
//! ## Varint format
//!
//! Unsigned integers use MSB base-128 groups, most significant group first.
//! Every byte except the last sets bit 0x80, and each continuation adds one
//! to the running value, so every integer has exactly one encoding:
//!
//! ```text
//! 0          -> 0x00
//! 127        -> 0x7f
//! 128        -> 0x80 0x00
//! 16511      -> 0xff 0x7f
//! ```
//!
//! ## Short IDs
//!
//! Short transaction IDs are 48-bit values carried in a u64; on the wire they
//! occupy exactly 6 little-endian bytes.

use thiserror::Error;

/// Errors raised while decoding untrusted bytes.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("input ended at offset {offset}, needed {needed} more bytes")]
    UnexpectedEnd { offset: usize, needed: usize },

    #[error("varint exceeds 64 bits")]
    VarIntOverflow,

    #[error("{0} trailing bytes after decoded object")]
    TrailingBytes(usize),

    #[error("declared length {len} exceeds limit {max}")]
    OversizedLength { len: u64, max: u64 },
}

/// Append-only wire serializer.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u32_le(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_u64_le(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a canonical varint (see module docs).
    pub fn put_varint(&mut self, mut n: u64) {
        // 64 bits / 7 bits per group, rounded up.
        let mut tmp = [0u8; 10];
        let mut len = 0;
        loop {
            tmp[len] = (n & 0x7f) as u8 | if len > 0 { 0x80 } else { 0x00 };
            if n <= 0x7f {
                break;
            }
            n = (n >> 7) - 1;
            len += 1;
        }
        for i in (0..=len).rev() {
            self.buf.push(tmp[i]);
        }
    }

    /// Writes the low 48 bits of a short ID as 6 little-endian bytes.
    pub fn put_short_id(&mut self, id: u64) {
        self.buf.extend_from_slice(&id.to_le_bytes()[..6]);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an untrusted byte slice.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEnd {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32_le(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("4-byte slice")))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, DecodeError> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().expect("8-byte slice")))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        self.take(n)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.take(N)?;
        Ok(bytes.try_into().expect("fixed-size slice"))
    }

    /// Reads a canonical varint, rejecting values that do not fit in 64 bits.
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let mut n: u64 = 0;
        loop {
            let byte = self.read_u8()?;
            if n > (u64::MAX >> 7) {
                return Err(DecodeError::VarIntOverflow);
            }
            n = (n << 7) | u64::from(byte & 0x7f);
            if byte & 0x80 != 0 {
                if n == u64::MAX {
                    return Err(DecodeError::VarIntOverflow);
                }
                n += 1;
            } else {
                return Ok(n);
            }
        }
    }

    /// Reads a 6-byte little-endian short ID, widened to a u64.
    pub fn read_short_id(&mut self) -> Result<u64, DecodeError> {
        let bytes = self.take(6)?;
        let mut widened = [0u8; 8];
        widened[..6].copy_from_slice(bytes);
        Ok(u64::from_le_bytes(widened))
    }
}

/// Objects with an exact wire form.
pub trait WireEncode {
    fn encode(&self, w: &mut ByteWriter);

    fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        self.encode(&mut w);
        w.into_bytes()
    }
}

/// Objects decodable from their exact wire form.
///
/// `from_bytes` requires the object to consume the whole input; embedded
/// decoding goes through `decode` on a shared cursor.
pub trait WireDecode: Sized {
    fn decode(r: &mut ByteReader<'_>) -> Result<Self, DecodeError>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = ByteReader::new(bytes);
        let value = Self::decode(&mut r)?;
        if !r.is_empty() {
            return Err(DecodeError::TrailingBytes(r.remaining()));
        }
        Ok(value)
    }
}
