//! Vault session: one pipeline, one encryption mode.

use std::sync::Arc;
use tracing::debug;

use crate::about::AboutService;
use crate::cipher::Cipher;
use crate::config::ClientConfig;
use crate::database::DatabaseService;
use crate::engine::EncryptionEngine;
use crate::error::{Error, Result};
use crate::pipeline::RequestPipeline;
use crate::stream::StreamCipher;
use crate::token::TokenSource;
use crate::transport::Transport;

/// Encryption state of a session.
enum Mode {
    Plain,
    Encrypted { engine: Arc<EncryptionEngine>, stream: StreamCipher },
}

/// Entry point for one vault session.
///
/// The cipher is attached while the session is being built and cannot be
/// replaced afterwards; switching ciphers means building a new `Vault`.
///
/// # Example
///
/// ```ignore
/// use docvault::prelude::*;
/// use docvault_http::HttpTransport;
///
/// # async fn run() -> Result<()> {
/// let config = ClientConfig::new("https://hive1.trinity-tech.io");
/// let transport = Arc::new(HttpTransport::new(&config)?);
/// let tokens = Arc::new(StaticTokenSource::new("access-token"));
///
/// let cipher = Cipher::derive("did:elastos:alice", 7, &passphrase, nonce)?;
/// let vault = Vault::new(transport, tokens, &config)?.with_encryption(&cipher)?;
///
/// let db = vault.database();
/// db.insert_one("works", &json!({"author": "john doe1"}), None).await?;
/// let found = db.find_one("works", Some(&json!({"author": "john doe1"})), None).await?;
/// # Ok(())
/// # }
/// ```
pub struct Vault {
    pipeline: Arc<RequestPipeline>,
    mode: Mode,
}

impl Vault {
    /// Creates a session without encryption.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` is invalid.
    pub fn new(
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenSource>,
        config: &ClientConfig,
    ) -> Result<Self> {
        config.validate()?;
        let pipeline = RequestPipeline::new(transport, tokens)
            .with_refresh_margin(config.token_refresh_margin());
        Ok(Self { pipeline: Arc::new(pipeline), mode: Mode::Plain })
    }

    /// Enables field-level and stream encryption under `cipher`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if encryption is already enabled or subkey
    /// derivation fails.
    pub fn with_encryption(self, cipher: &Cipher) -> Result<Self> {
        if matches!(self.mode, Mode::Encrypted { .. }) {
            return Err(Error::Config(
                "encryption is already enabled for this session; build a new Vault".to_string(),
            ));
        }

        debug!(cipher = %cipher.fingerprint(), "enabling encryption");
        let engine = Arc::new(EncryptionEngine::new(cipher)?);
        let stream = StreamCipher::new(cipher)?;
        Ok(Self { pipeline: self.pipeline, mode: Mode::Encrypted { engine, stream } })
    }

    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        matches!(self.mode, Mode::Encrypted { .. })
    }

    /// Returns the database service for this session.
    #[must_use]
    pub fn database(&self) -> DatabaseService {
        match &self.mode {
            Mode::Plain => DatabaseService::new(Arc::clone(&self.pipeline)),
            Mode::Encrypted { engine, .. } => {
                DatabaseService::encrypted(Arc::clone(&self.pipeline), Arc::clone(engine))
            }
        }
    }

    /// Returns the node metadata service.
    #[must_use]
    pub fn about(&self) -> AboutService {
        AboutService::new(Arc::clone(&self.pipeline))
    }

    /// Returns the stream cipher for file payloads, if encryption is enabled.
    #[must_use]
    pub const fn stream_cipher(&self) -> Option<&StreamCipher> {
        match &self.mode {
            Mode::Plain => None,
            Mode::Encrypted { stream, .. } => Some(stream),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseEnvelope;
    use crate::token::StaticTokenSource;
    use crate::transport::ApiRequest;
    use async_trait::async_trait;
    use secrecy::SecretVec;
    use serde_json::Value;

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn execute(&self, _: &ApiRequest, _: Option<&str>) -> Result<ResponseEnvelope> {
            Ok(ResponseEnvelope::ok(200, Value::Null))
        }
    }

    fn create_vault() -> Vault {
        let tokens = Arc::new(StaticTokenSource::new("t"));
        Vault::new(Arc::new(NullTransport), tokens, &ClientConfig::default()).unwrap()
    }

    fn cipher() -> Cipher {
        Cipher::new(SecretVec::new(vec![5; 32]), vec![6; 24]).unwrap()
    }

    #[test]
    fn test_plain_by_default() {
        let vault = create_vault();
        assert!(!vault.is_encrypted());
        assert!(!vault.database().is_encrypted());
        assert!(vault.stream_cipher().is_none());
    }

    #[test]
    fn test_with_encryption() {
        let vault = create_vault().with_encryption(&cipher()).unwrap();
        assert!(vault.is_encrypted());
        assert!(vault.database().is_encrypted());
        assert!(vault.stream_cipher().is_some());
    }

    #[test]
    fn test_encryption_cannot_be_reinitialised() {
        let vault = create_vault().with_encryption(&cipher()).unwrap();
        assert!(matches!(vault.with_encryption(&cipher()), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig::new("not-a-url");
        let tokens = Arc::new(StaticTokenSource::new("t"));
        let result = Vault::new(Arc::new(NullTransport), tokens, &config);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
