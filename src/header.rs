//! The fixed 16-byte preamble at the start of every archive.
//!
//! Four little-endian `u32` words announce the manifest's byte length three
//! times over:
//!
//! ```text
//! word0 = 4                     (sentinel)
//! word1 = manifest_len + 8
//! word2 = manifest_len + 4
//! word3 = manifest_len
//! ```
//!
//! The redundancy is a cheap corruption check: a truncated or overwritten
//! preamble will almost never keep all three relationships intact. Some
//! writers pad the manifest text to a 4-byte boundary with trailing spaces,
//! in which case `word1`/`word2` are computed against the padded length while
//! `word3` still holds the exact JSON length; the decoder accepts both forms.

use crate::error::{ArchiveError, Result};

/// Size of the preamble in bytes.
pub const PREAMBLE_LEN: usize = 16;

/// Constant value of the first word.
pub const SENTINEL: u32 = 4;

/// A decoded, validated preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Exact byte length of the manifest JSON text.
    pub manifest_len: u32,
    /// Bytes the manifest occupies on disk; equal to `manifest_len` unless
    /// the writer space-padded the text to a 4-byte boundary.
    pub stored_len: u32,
}

impl Header {
    /// Offset of the body region from the start of the archive file.
    pub fn body_start(&self) -> u64 {
        PREAMBLE_LEN as u64 + u64::from(self.stored_len)
    }

    /// Encode the preamble for a manifest of `manifest_len` bytes.
    /// Always emits the unpadded form.
    pub fn encode(manifest_len: u32) -> [u8; PREAMBLE_LEN] {
        let mut buf = [0u8; PREAMBLE_LEN];
        buf[0..4].copy_from_slice(&SENTINEL.to_le_bytes());
        buf[4..8].copy_from_slice(&(manifest_len + 8).to_le_bytes());
        buf[8..12].copy_from_slice(&(manifest_len + 4).to_le_bytes());
        buf[12..16].copy_from_slice(&manifest_len.to_le_bytes());
        buf
    }

    /// Decode and cross-check a preamble. Any mismatch is fatal: the manifest
    /// must not be read behind a header that fails validation.
    pub fn decode(buf: &[u8; PREAMBLE_LEN]) -> Result<Self> {
        let word = |i: usize| {
            let mut w = [0u8; 4];
            w.copy_from_slice(&buf[i * 4..i * 4 + 4]);
            u32::from_le_bytes(w)
        };
        let (w0, w1, w2, w3) = (word(0), word(1), word(2), word(3));

        if w0 != SENTINEL {
            return Err(ArchiveError::CorruptHeader(format!(
                "sentinel word is {w0}, expected {SENTINEL}"
            )));
        }

        // Compare in u64 so hostile inputs cannot overflow the checks.
        let (w1, w2, len) = (u64::from(w1), u64::from(w2), u64::from(w3));
        if w1 == len + 8 && w2 == len + 4 {
            return Ok(Self {
                manifest_len: w3,
                stored_len: w3,
            });
        }

        let padded = (len + 3) & !3;
        if w1 == padded + 8 && w2 == padded + 4 {
            return Ok(Self {
                manifest_len: w3,
                stored_len: padded as u32,
            });
        }

        Err(ArchiveError::CorruptHeader(format!(
            "size words disagree: {w1}/{w2} against manifest length {len}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let buf = Header::encode(1234);
        let header = Header::decode(&buf).unwrap();
        assert_eq!(header.manifest_len, 1234);
        assert_eq!(header.stored_len, 1234);
        assert_eq!(header.body_start(), 16 + 1234);
    }

    #[test]
    fn rejects_bad_sentinel() {
        let mut buf = Header::encode(100);
        buf[0] = 5;
        let err = Header::decode(&buf).unwrap_err();
        assert!(matches!(err, ArchiveError::CorruptHeader(_)));
    }

    #[test]
    fn rejects_mismatched_word1() {
        let mut buf = Header::encode(100);
        // word1 = len + 9 instead of len + 8
        buf[4..8].copy_from_slice(&109u32.to_le_bytes());
        let err = Header::decode(&buf).unwrap_err();
        assert!(matches!(err, ArchiveError::CorruptHeader(_)));
    }

    #[test]
    fn accepts_padded_size_words() {
        // Manifest of 10 bytes padded up to 12: words are (4, 20, 16, 10).
        let mut buf = [0u8; PREAMBLE_LEN];
        buf[0..4].copy_from_slice(&4u32.to_le_bytes());
        buf[4..8].copy_from_slice(&20u32.to_le_bytes());
        buf[8..12].copy_from_slice(&16u32.to_le_bytes());
        buf[12..16].copy_from_slice(&10u32.to_le_bytes());

        let header = Header::decode(&buf).unwrap();
        assert_eq!(header.manifest_len, 10);
        assert_eq!(header.stored_len, 12);
        assert_eq!(header.body_start(), 28);
    }

    #[test]
    fn padded_and_unpadded_agree_on_aligned_lengths() {
        let buf = Header::encode(16);
        let header = Header::decode(&buf).unwrap();
        assert_eq!(header.stored_len, 16);
    }
}
