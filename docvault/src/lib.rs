//! # `docvault`
//!
//! Client library for storing JSON documents in a remote vault while keeping
//! field values confidential from the vault operator.
//!
//! ## Features
//!
//! - Deterministic field-level encryption (AES-SIV) that keeps exact-match
//!   queries working on encrypted fields
//! - Encrypted filters and update operators
//! - Stream encryption (ChaCha20-Poly1305) for file payloads
//! - Typed error taxonomy for vault failures
//! - Authenticated request pipeline with single-flight token refresh
//!
//! ## Example
//!
//! ```rust,ignore
//! use docvault::prelude::*;
//!
//! let vault = Vault::new(transport, tokens, &config)?.with_encryption(&cipher)?;
//! let db = vault.database();
//!
//! db.insert_one("works", &json!({"author": "john doe1"}), None).await?;
//! let count = db.count_documents("works", Some(&json!({"author": "john doe1"})), None).await?;
//! ```

#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod about;
pub mod cipher;
pub mod config;
pub mod context;
pub mod database;
pub mod engine;
pub mod error;
pub mod header;
pub mod pipeline;
pub mod response;
pub mod stream;
pub mod taxonomy;
pub mod token;
pub mod transport;
pub mod vault;

pub mod prelude {
    //! Convenience re-exports for common use.
    pub use crate::about::{AboutService, NodeInfo, NodeVersion};
    pub use crate::cipher::Cipher;
    pub use crate::config::ClientConfig;
    pub use crate::database::{
        CountOptions, DatabaseService, DeleteResult, FindOptions, InsertOptions, InsertResult,
        QueryOptions, SortItem, SortOrder, UpdateOptions, UpdateResult,
    };
    pub use crate::engine::EncryptionEngine;
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::response::ResponseEnvelope;
    pub use crate::stream::{EncryptedFile, StreamCipher};
    pub use crate::token::{AccessToken, StaticTokenSource, TokenSource};
    pub use crate::transport::{ApiRequest, Method, Transport};
    pub use crate::vault::Vault;
}
