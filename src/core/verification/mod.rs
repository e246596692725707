//! Manifest checksum and the freshness gate
//!
//! The sidecar written after each successful archive is what the next run
//! consults to decide whether re-packaging is needed.

pub mod checksum;
pub mod freshness;

pub use checksum::{md5_hex, verify_sidecar, write_sidecar};
pub use freshness::{check_freshness, Freshness};
