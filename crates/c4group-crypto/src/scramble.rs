//! Directory header obfuscation for C4Group archives.
//!
//! Every 204-byte directory header is stored obfuscated: bytes at indices
//! i and i+2 are swapped for i stepping by 3, then every byte is XORed
//! with `0xED`. The swap pass is a sequence of disjoint transpositions and
//! the XOR pass is its own inverse, so the whole transform is an
//! involution: applying it twice restores the original buffer. One routine
//! therefore serves both directions; [`scramble`] and [`unscramble`] exist
//! so call sites read as what they do.

use thiserror::Error;

/// Size of a serialized directory header in bytes.
///
/// The format fixes this; headers of any other length do not exist.
pub const HEADER_SIZE: usize = 204;

/// Byte every header position is XORed with.
const XOR_KEY: u8 = 0xED;

/// Errors that can occur while (un)scrambling a header.
#[derive(Error, Debug)]
pub enum ScrambleError {
    /// The input is not exactly [`HEADER_SIZE`] bytes long.
    #[error("invalid group header length: {0} (must be {HEADER_SIZE} bytes)")]
    InvalidLength(usize),
}

/// Obfuscate a plaintext directory header for storage.
///
/// # Errors
///
/// Returns [`ScrambleError::InvalidLength`] if `header` is not exactly
/// [`HEADER_SIZE`] bytes.
pub fn scramble(header: &[u8]) -> Result<[u8; HEADER_SIZE], ScrambleError> {
    let mut buf: [u8; HEADER_SIZE] = header
        .try_into()
        .map_err(|_| ScrambleError::InvalidLength(header.len()))?;

    let mut i = 0;
    while i + 2 < HEADER_SIZE {
        buf.swap(i, i + 2);
        i += 3;
    }
    for byte in &mut buf {
        *byte ^= XOR_KEY;
    }

    Ok(buf)
}

/// Recover the plaintext directory header from its on-disk form.
///
/// The transform is an involution, so this is the same operation as
/// [`scramble`].
///
/// # Errors
///
/// Returns [`ScrambleError::InvalidLength`] if `header` is not exactly
/// [`HEADER_SIZE`] bytes.
pub fn unscramble(header: &[u8]) -> Result<[u8; HEADER_SIZE], ScrambleError> {
    scramble(header)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scramble_is_involution() {
        let mut header = [0u8; HEADER_SIZE];
        for (i, byte) in header.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }

        let scrambled = scramble(&header).expect("valid header length");
        assert_ne!(&header[..], &scrambled[..]);

        let restored = unscramble(&scrambled).expect("valid header length");
        assert_eq!(&header[..], &restored[..]);
    }

    #[test]
    fn test_scramble_known_vector() {
        // All zeros: the swap pass is a no-op, the XOR pass turns every
        // byte into the key.
        let scrambled = scramble(&[0u8; HEADER_SIZE]).expect("valid header length");
        assert!(scrambled.iter().all(|&b| b == 0xED));
    }

    #[test]
    fn test_scramble_swaps_leading_bytes() {
        let mut header = [0u8; HEADER_SIZE];
        header[0] = 0x01;
        header[2] = 0x02;

        let scrambled = scramble(&header).expect("valid header length");
        assert_eq!(scrambled[0], 0x02 ^ 0xED);
        assert_eq!(scrambled[1], 0xED);
        assert_eq!(scrambled[2], 0x01 ^ 0xED);
    }

    #[test]
    fn test_scramble_rejects_wrong_length() {
        assert!(matches!(
            scramble(&[0u8; 203]),
            Err(ScrambleError::InvalidLength(203))
        ));
        assert!(matches!(
            scramble(&[0u8; 205]),
            Err(ScrambleError::InvalidLength(205))
        ));
        assert!(matches!(
            scramble(&[]),
            Err(ScrambleError::InvalidLength(0))
        ));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The transform restores any header when applied twice.
            #[test]
            fn scramble_round_trips(header in prop::collection::vec(any::<u8>(), HEADER_SIZE)) {
                let scrambled = scramble(&header).expect("valid header length");
                let restored = unscramble(&scrambled).expect("valid header length");
                prop_assert_eq!(&header[..], &restored[..]);
            }

            /// Any length other than the fixed header size is rejected.
            #[test]
            fn wrong_lengths_rejected(len in (0usize..1024).prop_filter("not header size", |l| *l != HEADER_SIZE)) {
                prop_assert!(scramble(&vec![0u8; len]).is_err());
            }
        }
    }
}
