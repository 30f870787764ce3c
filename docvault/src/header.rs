//! Header format for stream ciphertext.
//!
//! The header carries what decryption needs besides the key:
//! - Format version
//! - Flags
//! - Nonce

use crate::error::Error;

/// Version of the stream ciphertext format.
pub const STREAM_FORMAT_VERSION: u8 = 1;

/// Nonce size for ChaCha20-Poly1305 (96 bits).
pub const STREAM_NONCE_SIZE: usize = 12;

const KNOWN_FLAGS: u8 = 0x01;

/// Header flags for stream options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderFlags(u8);

impl HeaderFlags {
    /// Creates empty flags.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Checks whether the payload was sealed with a caller-supplied label.
    #[must_use]
    pub const fn is_labelled(self) -> bool {
        (self.0 & 0x01) != 0
    }

    /// Sets the labelled flag.
    #[must_use]
    pub const fn with_labelled(mut self) -> Self {
        self.0 |= 0x01;
        self
    }

    /// Returns the raw flags value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Creates flags from a raw value.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        Self(value)
    }
}

/// Stream header.
///
/// Format:
/// ```text
/// [version:1][flags:1][nonce_len:1][nonce:12]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    version: u8,
    flags: HeaderFlags,
    nonce: [u8; STREAM_NONCE_SIZE],
}

impl StreamHeader {
    /// Serialized header size in bytes.
    pub const LEN: usize = 3 + STREAM_NONCE_SIZE;

    /// Creates a header for the current format version.
    #[must_use]
    pub const fn new(flags: HeaderFlags, nonce: [u8; STREAM_NONCE_SIZE]) -> Self {
        Self { version: STREAM_FORMAT_VERSION, flags, nonce }
    }

    /// Returns the format version.
    #[must_use]
    pub const fn version(&self) -> u8 {
        self.version
    }

    /// Returns the header flags.
    #[must_use]
    pub const fn flags(&self) -> HeaderFlags {
        self.flags
    }

    /// Returns the nonce.
    #[must_use]
    pub const fn nonce(&self) -> &[u8; STREAM_NONCE_SIZE] {
        &self.nonce
    }

    /// Serializes the header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::LEN);
        bytes.push(self.version);
        bytes.push(self.flags.as_u8());
        // Safe cast: STREAM_NONCE_SIZE is a small constant
        #[allow(clippy::cast_possible_truncation)]
        bytes.push(STREAM_NONCE_SIZE as u8);
        bytes.extend_from_slice(&self.nonce);
        bytes
    }

    /// Parses a header from the front of `data`.
    ///
    /// Returns the header and the number of bytes it occupied.
    ///
    /// # Errors
    ///
    /// Returns `Error::DecryptionFailed` if the data is truncated, the
    /// version is unsupported, or flags or nonce length are unknown.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), Error> {
        let [version, flags, nonce_len, rest @ ..] = data else {
            return Err(Error::DecryptionFailed("stream header truncated".to_string()));
        };

        if *version != STREAM_FORMAT_VERSION {
            return Err(Error::DecryptionFailed(format!(
                "unsupported stream format version {version} (supported: {STREAM_FORMAT_VERSION})"
            )));
        }

        if flags & !KNOWN_FLAGS != 0 {
            return Err(Error::DecryptionFailed(format!("unknown stream flags {flags:#04x}")));
        }

        if usize::from(*nonce_len) != STREAM_NONCE_SIZE {
            return Err(Error::DecryptionFailed(format!(
                "invalid stream nonce length {nonce_len} (expected {STREAM_NONCE_SIZE})"
            )));
        }

        let nonce: [u8; STREAM_NONCE_SIZE] = rest
            .get(..STREAM_NONCE_SIZE)
            .and_then(|n| n.try_into().ok())
            .ok_or_else(|| Error::DecryptionFailed("stream nonce truncated".to_string()))?;

        let header = Self { version: *version, flags: HeaderFlags::from_u8(*flags), nonce };
        Ok((header, Self::LEN))
    }
}
