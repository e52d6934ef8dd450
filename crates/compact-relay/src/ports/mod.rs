//! Port definitions for the compact-block relay subsystem.

pub mod outbound;
