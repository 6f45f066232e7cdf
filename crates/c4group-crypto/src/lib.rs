//! Obfuscation and checksum primitives for the C4Group archive format
//!
//! This crate provides the two byte-level primitives the container format
//! needs outside of ordinary compression:
//!
//! - **Header scrambling**: the reversible transpose-and-XOR transform
//!   applied to every 204-byte directory header on disk
//! - **Entry checksums**: CRC32 over entry content, stored in the optional
//!   per-entry checksum field
//!
//! # Examples
//!
//! ## Header round-trip
//!
//! ```
//! use c4group_crypto::{scramble, unscramble, HEADER_SIZE};
//!
//! let header = [0u8; HEADER_SIZE];
//! let on_disk = scramble(&header).expect("fixed-size header");
//! assert_eq!(unscramble(&on_disk).expect("fixed-size header"), header);
//! ```

#![warn(missing_docs)]

pub mod crc;
pub mod scramble;

pub use crc::{content_crc, verify_crc};
pub use scramble::{HEADER_SIZE, ScrambleError, scramble, unscramble};
