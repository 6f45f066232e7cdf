//! Compression envelope with doctored magic bytes.
//!
//! A C4Group archive on disk is an ordinary gzip stream whose first two
//! bytes have been replaced with `1E 8C` so standard tools do not
//! recognize it. Restoring the canonical gzip magic makes the payload
//! decompressible by any conformant decompressor; the inverse patch is
//! applied when saving. This two-byte substitution is the format's sole
//! "encryption" at the envelope level and must be reproduced exactly for
//! third-party readers to open the result.

use crate::error::{GroupError, GroupResult};
use flate2::Compression;
use flate2::read::{GzDecoder, GzEncoder};
use std::io::Read;

/// The two magic bytes a C4Group archive carries on disk.
pub const DISK_MAGIC: [u8; 2] = [0x1E, 0x8C];

/// The canonical gzip magic the disk bytes replace.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Unwrap raw archive bytes read from disk into the serialized group body.
///
/// The first two bytes are forced to the gzip magic before inflating, so
/// both doctored archives and plain gzip streams open.
///
/// # Errors
///
/// Fails with [`GroupError::TruncatedData`] when fewer than two bytes are
/// given and [`GroupError::Decompression`] when the patched stream does
/// not inflate.
pub fn unwrap(disk_bytes: &[u8]) -> GroupResult<Vec<u8>> {
    if disk_bytes.len() < DISK_MAGIC.len() {
        return Err(GroupError::TruncatedData {
            expected: DISK_MAGIC.len() as u64,
            actual: disk_bytes.len() as u64,
        });
    }

    let mut patched = disk_bytes.to_vec();
    patched[..GZIP_MAGIC.len()].copy_from_slice(&GZIP_MAGIC);

    let mut decoder = GzDecoder::new(patched.as_slice());
    let mut payload = Vec::new();
    decoder
        .read_to_end(&mut payload)
        .map_err(|e| GroupError::Decompression(e.to_string()))?;
    Ok(payload)
}

/// Wrap a serialized group body into the on-disk archive representation.
///
/// The body is gzip-compressed at best compression, then the first two
/// bytes of the result are overwritten with the disk magic.
///
/// # Errors
///
/// Fails with [`GroupError::Compression`] when the encoder fails.
pub fn wrap(payload: &[u8]) -> GroupResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(payload, Compression::best());
    let mut disk_bytes = Vec::new();
    encoder
        .read_to_end(&mut disk_bytes)
        .map_err(|e| GroupError::Compression(e.to_string()))?;

    disk_bytes[..DISK_MAGIC.len()].copy_from_slice(&DISK_MAGIC);
    Ok(disk_bytes)
}
