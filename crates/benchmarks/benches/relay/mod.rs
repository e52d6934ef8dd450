//! Benchmark modules for the relay core.

pub mod codec;
pub mod reconstruct;
pub mod short_id;
