//! Session cipher material and subkey derivation.
//!
//! A [`Cipher`] is the symmetric key plus session nonce shared by the field
//! engine and the stream cipher. Both consumers derive their own subkey from
//! it with HKDF-SHA256, so one session key never drives two algorithms.

use std::fmt;

use hkdf::Hkdf;
use secrecy::{ExposeSecret, SecretString, SecretVec};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Session key size in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of nonces produced by [`Cipher::generate_nonce`].
pub const SESSION_NONCE_SIZE: usize = 24;

/// Immutable symmetric key + session nonce for one vault session.
///
/// Every ciphertext written during a session depends on both values; a
/// session that later uses a different key or nonce can no longer query or
/// decrypt what was stored.
pub struct Cipher {
    key: SecretVec<u8>,
    nonce: Vec<u8>,
}

impl Cipher {
    /// Creates a cipher from raw key material.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the key is not 32 bytes or the nonce is empty.
    pub fn new(key: SecretVec<u8>, nonce: impl Into<Vec<u8>>) -> Result<Self> {
        let nonce = nonce.into();
        if key.expose_secret().len() != KEY_SIZE {
            return Err(Error::Config(format!(
                "cipher key must be {KEY_SIZE} bytes, got {}",
                key.expose_secret().len()
            )));
        }
        if nonce.is_empty() {
            return Err(Error::Config("session nonce must not be empty".to_string()));
        }
        Ok(Self { key, nonce })
    }

    /// Derives a cipher from a user identity, a secure code and a passphrase.
    ///
    /// The derivation is deterministic: the same inputs always yield the same
    /// key, which is what lets a later session read data written earlier.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the identifier or nonce is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use docvault::cipher::Cipher;
    /// use secrecy::SecretString;
    ///
    /// let pass = SecretString::new("storepass".to_string());
    /// let a = Cipher::derive("did:elastos:alice", 7, &pass, vec![1; 24]).unwrap();
    /// let b = Cipher::derive("did:elastos:alice", 7, &pass, vec![1; 24]).unwrap();
    /// assert_eq!(a.fingerprint(), b.fingerprint());
    /// ```
    pub fn derive(
        identifier: &str,
        secure_code: u32,
        passphrase: &SecretString,
        nonce: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        if identifier.is_empty() {
            return Err(Error::Config("cipher identifier must not be empty".to_string()));
        }

        let hkdf = Hkdf::<Sha256>::new(
            Some(identifier.as_bytes()),
            passphrase.expose_secret().as_bytes(),
        );
        let info = format!("docvault|cipher|{identifier}|{secure_code}");

        let mut key = vec![0u8; KEY_SIZE];
        hkdf.expand(info.as_bytes(), &mut key)
            .map_err(|_| Error::Config("cipher key derivation failed".to_string()))?;

        Self::new(SecretVec::new(key), nonce)
    }

    /// Generates a random session nonce.
    #[must_use]
    pub fn generate_nonce() -> Vec<u8> {
        use chacha20poly1305::aead::{rand_core::RngCore, OsRng};

        let mut nonce = vec![0u8; SESSION_NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }

    /// Returns the session nonce.
    #[must_use]
    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    /// Short non-secret identifier of the key material, for logs and tests.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::Digest;

        let digest = Sha256::new()
            .chain_update(b"docvault|fingerprint|")
            .chain_update(self.key.expose_secret())
            .chain_update(&self.nonce)
            .finalize();
        digest[..8].iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Derives a purpose-bound subkey of `len` bytes.
    pub(crate) fn subkey(&self, purpose: &str, len: usize) -> Result<Zeroizing<Vec<u8>>> {
        let hkdf = Hkdf::<Sha256>::new(None, self.key.expose_secret());
        let mut out = Zeroizing::new(vec![0u8; len]);
        hkdf.expand(format!("docvault|{purpose}").as_bytes(), &mut out)
            .map_err(|_| Error::Config(format!("subkey derivation failed for {purpose}")))?;
        Ok(out)
    }
}

impl Clone for Cipher {
    fn clone(&self) -> Self {
        Self { key: SecretVec::new(self.key.expose_secret().clone()), nonce: self.nonce.clone() }
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("key", &"[REDACTED]")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
