//! Single-pass AEAD over opaque byte payloads.
//!
//! Output layout: `[header][ciphertext || tag]`, see [`StreamHeader`].

use chacha20poly1305::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng, Payload},
    ChaCha20Poly1305, Nonce,
};
use secrecy::{ExposeSecret, SecretVec};

use crate::cipher::Cipher;
use crate::error::{Error, Result};
use crate::header::{HeaderFlags, StreamHeader, STREAM_NONCE_SIZE};

const STREAM_KEY_SIZE: usize = 32;

/// Encrypts and decrypts whole byte payloads (file bodies, blobs).
///
/// Unlike [`crate::engine::EncryptionEngine`], every call draws a fresh
/// random nonce, so equal payloads produce different ciphertexts.
///
/// # Example
///
/// ```
/// use docvault::cipher::Cipher;
/// use docvault::stream::StreamCipher;
/// use secrecy::SecretVec;
///
/// let cipher = Cipher::new(SecretVec::new(vec![1; 32]), vec![2; 24]).unwrap();
/// let stream = StreamCipher::new(&cipher).unwrap();
///
/// let sealed = stream.encrypt_stream(b"file body").unwrap();
/// assert_eq!(stream.decrypt_stream(&sealed).unwrap(), b"file body");
/// ```
pub struct StreamCipher {
    key: SecretVec<u8>,
}

impl StreamCipher {
    /// Creates a stream cipher keyed from `cipher`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if subkey derivation fails.
    pub fn new(cipher: &Cipher) -> Result<Self> {
        let key = cipher.subkey("stream/chacha20poly1305", STREAM_KEY_SIZE)?;
        Ok(Self { key: SecretVec::new(key.to_vec()) })
    }

    /// Encrypts a payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEncryptionInput` if the AEAD rejects the input.
    pub fn encrypt_stream(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.seal(plaintext, None)
    }

    /// Decrypts a payload produced by [`Self::encrypt_stream`].
    ///
    /// # Errors
    ///
    /// Returns `Error::DecryptionFailed` on a malformed header, a wrong
    /// cipher or tampered data. No partial plaintext is ever returned.
    pub fn decrypt_stream(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.open(ciphertext, None)
    }

    /// Encrypts a payload bound to `label`, which must be presented again
    /// on decryption.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEncryptionInput` if the AEAD rejects the input.
    pub fn encrypt_labelled(&self, plaintext: &[u8], label: &str) -> Result<Vec<u8>> {
        self.seal(plaintext, Some(label))
    }

    /// Decrypts a payload produced by [`Self::encrypt_labelled`].
    ///
    /// # Errors
    ///
    /// Returns `Error::DecryptionFailed` if the label differs or any check fails.
    pub fn decrypt_labelled(&self, ciphertext: &[u8], label: &str) -> Result<Vec<u8>> {
        self.open(ciphertext, Some(label))
    }

    fn seal(&self, plaintext: &[u8], label: Option<&str>) -> Result<Vec<u8>> {
        let cipher = self.aead()?;

        let mut nonce_bytes = [0u8; STREAM_NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let flags =
            if label.is_some() {
                HeaderFlags::empty().with_labelled()
            } else {
                HeaderFlags::empty()
            };
        let header = StreamHeader::new(flags, nonce_bytes);
        let header_bytes = header.to_bytes();

        // Header is authenticated along with the label
        let aad = associated_data(&header_bytes, label);
        let ciphertext = cipher
            .encrypt(&Nonce::from(nonce_bytes), Payload { msg: plaintext, aad: &aad })
            .map_err(|e| Error::InvalidEncryptionInput(format!("stream encryption failed: {e}")))?;

        let mut result = Vec::with_capacity(header_bytes.len() + ciphertext.len());
        result.extend_from_slice(&header_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn open(&self, data: &[u8], label: Option<&str>) -> Result<Vec<u8>> {
        let (header, header_len) = StreamHeader::from_bytes(data)?;

        if header.flags().is_labelled() != label.is_some() {
            return Err(Error::DecryptionFailed("stream label mismatch".to_string()));
        }

        let cipher = self.aead()?;
        let aad = associated_data(&data[..header_len], label);
        cipher
            .decrypt(&Nonce::from(*header.nonce()), Payload { msg: &data[header_len..], aad: &aad })
            .map_err(|_| {
                Error::DecryptionFailed(
                    "stream authentication failed: wrong cipher or tampered data".to_string(),
                )
            })
    }

    fn aead(&self) -> Result<ChaCha20Poly1305> {
        ChaCha20Poly1305::new_from_slice(self.key.expose_secret())
            .map_err(|e| Error::Config(format!("invalid stream key: {e}")))
    }
}

impl Clone for StreamCipher {
    fn clone(&self) -> Self {
        Self { key: SecretVec::new(self.key.expose_secret().clone()) }
    }
}

fn associated_data(header: &[u8], label: Option<&str>) -> Vec<u8> {
    let mut aad = header.to_vec();
    if let Some(label) = label {
        aad.extend_from_slice(label.as_bytes());
    }
    aad
}

/// A named payload paired with a [`StreamCipher`].
///
/// The name is bound into the ciphertext, so bytes uploaded as one file
/// cannot be passed off as another.
pub struct EncryptedFile<'a> {
    stream: &'a StreamCipher,
    name: String,
}

impl<'a> EncryptedFile<'a> {
    /// Wraps `stream` for the file at `name`.
    pub fn new(stream: &'a StreamCipher, name: impl Into<String>) -> Self {
        Self { stream, name: name.into() }
    }

    /// Returns the file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encrypts the file body.
    ///
    /// # Errors
    ///
    /// See [`StreamCipher::encrypt_labelled`].
    pub fn encrypt(&self, body: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        self.stream.encrypt_labelled(body.as_ref(), &self.name)
    }

    /// Decrypts the file body.
    ///
    /// # Errors
    ///
    /// See [`StreamCipher::decrypt_labelled`].
    pub fn decrypt(&self, sealed: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        self.stream.decrypt_labelled(sealed.as_ref(), &self.name)
    }
}
