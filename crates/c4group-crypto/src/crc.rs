//! Entry content checksums.
//!
//! C4Group entry records carry an optional CRC32 of the entry's content,
//! guarded by a presence flag. The checksum is computed when an archive is
//! rebuilt from the filesystem and can be verified against lazily read
//! content.

/// Compute the CRC32 of an entry's content.
pub fn content_crc(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Check content bytes against a stored checksum.
pub fn verify_crc(data: &[u8], expected: u32) -> bool {
    content_crc(data) == expected
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_crc_known_vector() {
        // Standard CRC-32 (IEEE) check value.
        assert_eq!(content_crc(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_crc_empty() {
        assert_eq!(content_crc(b""), 0);
    }

    #[test]
    fn test_verify() {
        let data = b"group entry content";
        let crc = content_crc(data);
        assert!(verify_crc(data, crc));
        assert!(!verify_crc(data, crc.wrapping_add(1)));
        assert!(!verify_crc(b"other content", crc));
    }
}
