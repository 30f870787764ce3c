//! Deterministic field-level encryption of documents, filters and updates.
//!
//! Every scalar leaf is sealed with AES-256-SIV under a nonce derived from
//! the session nonce and the leaf's [`FieldPath`]. The same value at the same
//! path therefore always produces the same ciphertext, which is what lets
//! the vault match encrypted filters against encrypted documents.
//!
//! # Security Properties
//!
//! - **Deterministic**: same plaintext + path → same ciphertext
//! - **Misuse-resistant**: SIV stays safe when the derived nonce repeats
//! - **Authenticated**: tampering or a foreign cipher fails decryption
//! - **Path-bound**: the path is both nonce input and associated data
//!
//! # Security Warning
//!
//! Equal values at the same path are visible to the vault operator as equal
//! ciphertexts. That is the price of exact-match queries.
//!
//! # Wire Form
//!
//! A sealed leaf is replaced by `{"__binary": "<base64 ciphertext>"}`. The
//! plaintext is the JSON encoding of the scalar, so type survives the round
//! trip. Integral floats are encoded as integers (`5.0` seals and opens as
//! `5`) because the vault compares numbers by value. `null` leaves and
//! anything under `_id` are left untouched.

use aes_siv::{
    aead::{Aead, KeyInit, Payload},
    Aes256SivAead,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretVec};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::cipher::Cipher;
use crate::context::FieldPath;
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;
type SivNonce = aes_siv::aead::Nonce<Aes256SivAead>;

/// Key under which a sealed leaf carries its ciphertext.
pub const CIPHERTEXT_TAG: &str = "__binary";

/// Reserved identity field, never encrypted.
pub const ID_FIELD: &str = "_id";

/// AES-256-SIV requires a 64-byte key (512 bits).
const SIV_KEY_SIZE: usize = 64;

const LEAF_NONCE_SIZE: usize = 16;

/// Filter operators whose operands are not values to be matched.
const PASSTHROUGH_OPERATORS: &[&str] = &[
    "$exists",
    "$type",
    "$size",
    "$regex",
    "$options",
    "$mod",
    "$where",
    "$expr",
    "$text",
    "$search",
    "$comment",
    "$jsonSchema",
    "$bitsAllSet",
    "$bitsAnySet",
    "$bitsAllClear",
    "$bitsAnyClear",
    "$near",
    "$geoWithin",
    "$geoIntersects",
];

/// Update operators whose values are sealed. Others pass through as-is.
pub const ENCRYPTED_UPDATE_OPERATORS: &[&str] =
    &["$set", "$setOnInsert", "$push", "$addToSet", "$pull", "$pullAll"];

/// Applies a session [`Cipher`] to document, filter and update trees.
///
/// The engine holds no mutable state; one instance can serve any number of
/// concurrent calls.
///
/// # Example
///
/// ```
/// use docvault::cipher::Cipher;
/// use docvault::engine::EncryptionEngine;
/// use secrecy::SecretVec;
/// use serde_json::json;
///
/// let cipher = Cipher::new(SecretVec::new(vec![0x42; 32]), vec![7; 24]).unwrap();
/// let engine = EncryptionEngine::new(&cipher).unwrap();
///
/// let doc = json!({"author": "john doe1"});
/// let sealed = engine.encrypt_document(&doc).unwrap();
/// let filter = engine.encrypt_filter(&json!({"author": "john doe1"})).unwrap();
///
/// assert_eq!(sealed["author"], filter["author"]); // queryable
/// assert_eq!(engine.decrypt_document(&sealed).unwrap(), doc);
/// ```
pub struct EncryptionEngine {
    key: SecretVec<u8>,
    session_nonce: Vec<u8>,
}

impl EncryptionEngine {
    /// Creates an engine bound to `cipher`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if subkey derivation fails.
    pub fn new(cipher: &Cipher) -> Result<Self> {
        let key = cipher.subkey("field/aes-siv", SIV_KEY_SIZE)?;
        Ok(Self { key: SecretVec::new(key.to_vec()), session_nonce: cipher.nonce().to_vec() })
    }

    /// Seals every scalar leaf of a document.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEncryptionInput` if `doc` is not an object.
    pub fn encrypt_document(&self, doc: &Value) -> Result<Value> {
        require_object(doc, "document")?;
        self.sealer()?.seal(doc, &FieldPath::root())
    }

    /// Opens every sealed leaf of a document.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEncryptionInput` if `doc` is not an object, or
    /// `Error::DecryptionFailed` if any sealed leaf fails to open.
    pub fn decrypt_document(&self, doc: &Value) -> Result<Value> {
        require_object(doc, "document")?;
        self.sealer()?.open(doc, &FieldPath::root())
    }

    /// Seals each document, preserving order and count.
    ///
    /// # Errors
    ///
    /// Fails on the first document that [`Self::encrypt_document`] rejects.
    pub fn encrypt_documents(&self, docs: &[Value]) -> Result<Vec<Value>> {
        docs.iter().map(|doc| self.encrypt_document(doc)).collect()
    }

    /// Opens each document, preserving order and count.
    ///
    /// # Errors
    ///
    /// Fails on the first document that [`Self::decrypt_document`] rejects.
    pub fn decrypt_documents(&self, docs: &[Value]) -> Result<Vec<Value>> {
        docs.iter().map(|doc| self.decrypt_document(doc)).collect()
    }

    /// Seals the comparison operands of a filter.
    ///
    /// Operator keys stay readable; operands of non-comparison operators
    /// (`$exists`, `$regex`, ...) are left as-is. A `null` filter matches
    /// everything and is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEncryptionInput` if `filter` is neither an
    /// object nor `null`.
    pub fn encrypt_filter(&self, filter: &Value) -> Result<Value> {
        if filter.is_null() {
            return Ok(Value::Null);
        }
        require_object(filter, "filter")?;
        self.sealer()?.seal(filter, &FieldPath::root())
    }

    /// Seals the values under recognised update operators.
    ///
    /// Only [`ENCRYPTED_UPDATE_OPERATORS`] are transformed. Anything else
    /// (`$inc`, `$unset`, `$rename`, ...) is sent in the clear.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEncryptionInput` if `update` is not an object.
    pub fn encrypt_update(&self, update: &Value) -> Result<Value> {
        let map = require_object(update, "update")?;
        let sealer = self.sealer()?;

        let mut out = Map::with_capacity(map.len());
        for (operator, spec) in map {
            let value = if ENCRYPTED_UPDATE_OPERATORS.contains(&operator.as_str()) {
                sealer.seal(spec, &FieldPath::root())?
            } else {
                spec.clone()
            };
            out.insert(operator.clone(), value);
        }
        Ok(Value::Object(out))
    }

    fn sealer(&self) -> Result<Sealer<'_>> {
        let siv = Aes256SivAead::new_from_slice(self.key.expose_secret())
            .map_err(|e| Error::Config(format!("failed to create AES-SIV cipher: {e}")))?;
        Ok(Sealer { siv, session_nonce: &self.session_nonce })
    }
}

impl Clone for EncryptionEngine {
    fn clone(&self) -> Self {
        Self {
            key: SecretVec::new(self.key.expose_secret().clone()),
            session_nonce: self.session_nonce.clone(),
        }
    }
}

/// Per-call tree walker holding the keyed AES-SIV instance.
struct Sealer<'a> {
    siv: Aes256SivAead,
    session_nonce: &'a [u8],
}

impl Sealer<'_> {
    fn seal(&self, value: &Value, path: &FieldPath) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Bool(_) | Value::Number(_) | Value::String(_) => self.seal_leaf(value, path),
            Value::Array(items) => items
                .iter()
                .map(|item| self.seal(item, path))
                .collect::<Result<_>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, child) in map {
                    let passthrough =
                        key == ID_FIELD || PASSTHROUGH_OPERATORS.contains(&key.as_str());
                    let sealed = if passthrough {
                        child.clone()
                    } else if is_operator(key) {
                        self.seal(child, path)?
                    } else {
                        self.seal(child, &path.child(key))?
                    };
                    out.insert(key.clone(), sealed);
                }
                Ok(Value::Object(out))
            }
        }
    }

    fn open(&self, value: &Value, path: &FieldPath) -> Result<Value> {
        match value {
            Value::Object(map) => {
                if let Some(encoded) = sealed_payload(map) {
                    return self.open_leaf(encoded, path);
                }
                let mut out = Map::with_capacity(map.len());
                for (key, child) in map {
                    let opened = if key == ID_FIELD {
                        child.clone()
                    } else if is_operator(key) {
                        self.open(child, path)?
                    } else {
                        self.open(child, &path.child(key))?
                    };
                    out.insert(key.clone(), opened);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.open(item, path))
                .collect::<Result<_>>()
                .map(Value::Array),
            scalar => Ok(scalar.clone()),
        }
    }

    fn seal_leaf(&self, value: &Value, path: &FieldPath) -> Result<Value> {
        let plaintext = serde_json::to_vec(&canonical_scalar(value)).map_err(|e| {
            Error::InvalidEncryptionInput(format!("unencodable leaf at {path}: {e}"))
        })?;

        // Path doubles as AAD so a ciphertext moved to another field fails to open
        let aad = path.to_string();
        let nonce = self.leaf_nonce(&aad)?;
        let ciphertext = self
            .siv
            .encrypt(&nonce, Payload { msg: &plaintext, aad: aad.as_bytes() })
            .map_err(|e| {
                Error::InvalidEncryptionInput(format!("cannot seal leaf at {path}: {e}"))
            })?;

        let mut sealed = Map::with_capacity(1);
        sealed.insert(CIPHERTEXT_TAG.to_string(), Value::String(STANDARD.encode(ciphertext)));
        Ok(Value::Object(sealed))
    }

    fn open_leaf(&self, encoded: &str, path: &FieldPath) -> Result<Value> {
        let ciphertext = STANDARD.decode(encoded).map_err(|e| {
            Error::DecryptionFailed(format!("invalid ciphertext encoding at {path}: {e}"))
        })?;

        let aad = path.to_string();
        let nonce = self.leaf_nonce(&aad)?;
        let plaintext = self
            .siv
            .decrypt(&nonce, Payload { msg: &ciphertext, aad: aad.as_bytes() })
            .map_err(|_| {
                Error::DecryptionFailed(format!(
                    "authentication failed at {path}: wrong cipher or tampered data"
                ))
            })?;

        let value: Value = serde_json::from_slice(&plaintext)
            .map_err(|e| Error::DecryptionFailed(format!("corrupt plaintext at {path}: {e}")))?;
        if value.is_object() || value.is_array() {
            return Err(Error::DecryptionFailed(format!("non-scalar plaintext at {path}")));
        }
        Ok(value)
    }

    /// `HMAC-SHA256(session_nonce, "leaf|" || path)[..16]`
    fn leaf_nonce(&self, path: &str) -> Result<SivNonce> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.session_nonce)
            .map_err(|e| Error::Config(format!("invalid session nonce: {e}")))?;
        mac.update(b"leaf|");
        mac.update(path.as_bytes());
        let digest = mac.finalize().into_bytes();
        Ok(SivNonce::clone_from_slice(&digest[..LEAF_NONCE_SIZE]))
    }
}

/// Integral floats are written as integers so `5` and `5.0` seal alike.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::float_cmp)]
fn canonical_scalar(value: &Value) -> Value {
    let Value::Number(number) = value else { return value.clone() };
    if number.is_i64() || number.is_u64() {
        return value.clone();
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Value::from(f as i64)
        }
        Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => Value::from(f as u64),
        _ => value.clone(),
    }
}

fn is_operator(key: &str) -> bool {
    key.starts_with('$')
}

fn sealed_payload(map: &Map<String, Value>) -> Option<&str> {
    if map.len() != 1 {
        return None;
    }
    map.get(CIPHERTEXT_TAG).and_then(Value::as_str)
}

fn require_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        Error::InvalidEncryptionInput(format!(
            "{what} root must be a JSON object, got {}",
            kind_of(value)
        ))
    })
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn create_test_engine() -> EncryptionEngine {
        engine_with(0x42, 7)
    }

    fn engine_with(key_byte: u8, nonce_byte: u8) -> EncryptionEngine {
        let cipher = Cipher::new(SecretVec::new(vec![key_byte; 32]), vec![nonce_byte; 24]).unwrap();
        EncryptionEngine::new(&cipher).unwrap()
    }

    fn is_sealed(value: &Value) -> bool {
        value.as_object().is_some_and(|m| sealed_payload(m).is_some())
    }

    #[test]
    fn test_document_round_trip() {
        let engine = create_test_engine();
        let doc = json!({
            "_id": "6241471ab042663cc9f179e7",
            "author": "john doe1",
            "title": "Eve for Dummies1",
            "pages": 312,
            "price": 9.5,
            "published": true,
            "isbn": null,
            "tags": ["a", "b"],
            "meta": {"lang": "en", "editions": [1, 2]}
        });

        let sealed = engine.encrypt_document(&doc).unwrap();
        assert_ne!(sealed, doc);
        assert_eq!(engine.decrypt_document(&sealed).unwrap(), doc);
    }

    #[test]
    fn test_structure_is_preserved() {
        let engine = create_test_engine();
        let doc = json!({"tags": ["a", "b"], "meta": {"lang": "en"}, "isbn": null});
        let sealed = engine.encrypt_document(&doc).unwrap();

        assert_eq!(sealed["tags"].as_array().unwrap().len(), 2);
        assert!(is_sealed(&sealed["tags"][0]));
        assert!(is_sealed(&sealed["meta"]["lang"]));
        assert_eq!(sealed["isbn"], Value::Null);
    }

    #[test]
    fn test_id_is_never_encrypted() {
        let engine = create_test_engine();
        let doc = json!({"_id": "abc", "author": "x"});
        let sealed = engine.encrypt_document(&doc).unwrap();
        assert_eq!(sealed["_id"], json!("abc"));
        assert!(is_sealed(&sealed["author"]));
    }

    #[test]
    fn test_encryption_is_deterministic() {
        let engine = create_test_engine();
        let doc = json!({"author": "john doe1"});
        let a = engine.encrypt_document(&doc).unwrap();
        let b = engine.encrypt_document(&doc).unwrap();
        assert_eq!(a, b, "Encryption must be deterministic");
    }

    #[test]
    fn test_same_value_different_paths_differ() {
        let engine = create_test_engine();
        let sealed = engine.encrypt_document(&json!({"author": "x", "editor": "x"})).unwrap();
        assert_ne!(sealed["author"], sealed["editor"]);
    }

    #[test]
    fn test_type_survives_round_trip() {
        let engine = create_test_engine();
        let sealed = engine.encrypt_document(&json!({"a": 1, "b": "1"})).unwrap();
        let moved = json!({"a": sealed["a"].clone(), "b": sealed["b"].clone()});
        let opened = engine.decrypt_document(&moved).unwrap();
        assert_eq!(opened["a"], json!(1));
        assert_eq!(opened["b"], json!("1"));

        let as_number = engine.encrypt_filter(&json!({"a": 1})).unwrap();
        let as_string = engine.encrypt_filter(&json!({"a": "1"})).unwrap();
        assert_ne!(as_number["a"], as_string["a"]);
    }

    #[test]
    fn test_integral_float_matches_integer() {
        let engine = create_test_engine();
        let doc = engine.encrypt_document(&json!({"age": 5})).unwrap();
        let filter = engine.encrypt_filter(&json!({"age": 5.0})).unwrap();
        assert_eq!(doc["age"], filter["age"]);

        let sealed = engine.encrypt_document(&json!({"age": 5.0})).unwrap();
        assert_eq!(engine.decrypt_document(&sealed).unwrap()["age"], json!(5));

        let fractional = engine.encrypt_filter(&json!({"age": 5.5})).unwrap();
        assert_ne!(doc["age"], fractional["age"]);
        let sealed = engine.encrypt_document(&json!({"age": 5.5})).unwrap();
        assert_eq!(engine.decrypt_document(&sealed).unwrap()["age"], json!(5.5));
    }

    #[test]
    fn test_large_integral_float_matches_integer() {
        let engine = create_test_engine();
        let doc = engine.encrypt_document(&json!({"n": -1_000_000_000_000_i64})).unwrap();
        let filter = engine.encrypt_filter(&json!({"n": -1.0e12})).unwrap();
        assert_eq!(doc["n"], filter["n"]);
    }

    #[test]
    fn test_cross_cipher_isolation() {
        let alice = create_test_engine();
        let other_key = engine_with(0x43, 7);
        let other_nonce = engine_with(0x42, 8);

        let sealed = alice.encrypt_document(&json!({"author": "john doe1"})).unwrap();

        for engine in [other_key, other_nonce] {
            let err = engine.decrypt_document(&sealed).unwrap_err();
            assert!(matches!(err, Error::DecryptionFailed(_)));
        }
    }

    #[test]
    fn test_moved_ciphertext_fails() {
        let engine = create_test_engine();
        let sealed = engine.encrypt_document(&json!({"author": "x"})).unwrap();
        let moved = json!({"editor": sealed["author"].clone()});
        assert!(matches!(engine.decrypt_document(&moved), Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let engine = create_test_engine();
        let sealed = engine.encrypt_document(&json!({"author": "x"})).unwrap();

        let encoded = sealed["author"][CIPHERTEXT_TAG].as_str().unwrap();
        let mut bytes = STANDARD.decode(encoded).unwrap();
        bytes[0] ^= 0xFF;
        let tampered = json!({"author": {CIPHERTEXT_TAG: STANDARD.encode(bytes)}});

        assert!(matches!(engine.decrypt_document(&tampered), Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_bad_encoding_fails() {
        let engine = create_test_engine();
        let doc = json!({"author": {CIPHERTEXT_TAG: "not base64!!"}});
        assert!(matches!(engine.decrypt_document(&doc), Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_plain_leaves_pass_through_decrypt() {
        let engine = create_test_engine();
        let doc = json!({"author": "plain", "n": 3});
        assert_eq!(engine.decrypt_document(&doc).unwrap(), doc);
    }

    #[test]
    fn test_filter_matches_document_ciphertext() {
        let engine = create_test_engine();
        let sealed_doc = engine.encrypt_document(&json!({"author": "john doe1", "n": 5})).unwrap();
        let sealed_filter = engine.encrypt_filter(&json!({"author": "john doe1"})).unwrap();
        assert_eq!(sealed_filter["author"], sealed_doc["author"]);
    }

    #[test]
    fn test_filter_operators_preserved() {
        let engine = create_test_engine();
        let filter = json!({"$and": [{"age": {"$gt": 5}}]});
        let sealed = engine.encrypt_filter(&filter).unwrap();

        let operand = &sealed["$and"][0]["age"]["$gt"];
        assert!(is_sealed(operand));

        // The operand is sealed at path "age", same as a stored document field.
        let doc = engine.encrypt_document(&json!({"age": 5})).unwrap();
        assert_eq!(operand, &doc["age"]);
    }

    #[test]
    fn test_filter_in_matches_array_elements() {
        let engine = create_test_engine();
        let doc = engine.encrypt_document(&json!({"tags": ["rust", "crypto"]})).unwrap();
        let filter = engine.encrypt_filter(&json!({"tags": {"$in": ["crypto"]}})).unwrap();
        assert_eq!(filter["tags"]["$in"][0], doc["tags"][1]);
    }

    #[test]
    fn test_filter_passthrough_operators() {
        let engine = create_test_engine();
        let filter = json!({
            "author": {"$exists": true},
            "title": {"$regex": "^Eve", "$options": "i"},
            "tags": {"$size": 2}
        });
        assert_eq!(engine.encrypt_filter(&filter).unwrap(), filter);
    }

    #[test]
    fn test_filter_id_untouched() {
        let engine = create_test_engine();
        let filter = json!({"_id": {"$in": ["a", "b"]}});
        assert_eq!(engine.encrypt_filter(&filter).unwrap(), filter);
    }

    #[test]
    fn test_null_filter_passes_through() {
        let engine = create_test_engine();
        assert_eq!(engine.encrypt_filter(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_update_recognised_operators() {
        let engine = create_test_engine();
        let update = json!({
            "$set": {"author": "john doe1", "title": "Eve for Dummies1_1"},
            "$setOnInsert": {"title": "Eve for Dummies4"},
            "$inc": {"pages": 1},
            "$unset": {"draft": ""}
        });
        let sealed = engine.encrypt_update(&update).unwrap();

        let doc = engine.encrypt_document(&json!({"author": "john doe1"})).unwrap();
        assert_eq!(sealed["$set"]["author"], doc["author"]);
        assert!(is_sealed(&sealed["$setOnInsert"]["title"]));
        assert_eq!(sealed["$inc"], update["$inc"]);
        assert_eq!(sealed["$unset"], update["$unset"]);
    }

    #[test]
    fn test_update_dotted_path_matches_nested_document() {
        let engine = create_test_engine();
        let update = engine.encrypt_update(&json!({"$set": {"meta.lang": "de"}})).unwrap();
        let doc = engine.encrypt_document(&json!({"meta": {"lang": "de"}})).unwrap();
        assert_eq!(update["$set"]["meta.lang"], doc["meta"]["lang"]);
    }

    #[test]
    fn test_update_push_each() {
        let engine = create_test_engine();
        let update = engine.encrypt_update(&json!({"$push": {"tags": {"$each": ["x"]}}})).unwrap();
        let doc = engine.encrypt_document(&json!({"tags": ["x"]})).unwrap();
        assert_eq!(update["$push"]["tags"]["$each"][0], doc["tags"][0]);
    }

    #[test]
    fn test_non_object_roots_rejected() {
        let engine = create_test_engine();
        for bad in [json!("text"), json!([1, 2]), json!(3)] {
            assert!(matches!(engine.encrypt_document(&bad), Err(Error::InvalidEncryptionInput(_))));
            assert!(matches!(engine.decrypt_document(&bad), Err(Error::InvalidEncryptionInput(_))));
            assert!(matches!(engine.encrypt_filter(&bad), Err(Error::InvalidEncryptionInput(_))));
            assert!(matches!(engine.encrypt_update(&bad), Err(Error::InvalidEncryptionInput(_))));
        }
        let err = engine.encrypt_document(&Value::Null).unwrap_err();
        assert!(matches!(err, Error::InvalidEncryptionInput(_)));
    }

    #[test]
    fn test_documents_preserve_order_and_count() {
        let engine = create_test_engine();
        let docs = vec![json!({"author": "a"}), json!({"author": "b"}), json!({"author": "a"})];
        let sealed = engine.encrypt_documents(&docs).unwrap();

        assert_eq!(sealed.len(), 3);
        assert_eq!(sealed[0], sealed[2]);
        assert_ne!(sealed[0], sealed[1]);
        assert_eq!(engine.decrypt_documents(&sealed).unwrap(), docs);
    }

    #[test]
    fn test_documents_fail_on_first_bad_element() {
        let engine = create_test_engine();
        let docs = vec![json!({"author": "a"}), json!("not a doc")];
        assert!(matches!(engine.encrypt_documents(&docs), Err(Error::InvalidEncryptionInput(_))));
    }

    #[test]
    fn test_engine_clone() {
        let engine1 = create_test_engine();
        let engine2 = engine1.clone();
        let doc = json!({"author": "x"});
        let sealed = engine1.encrypt_document(&doc).unwrap();
        assert_eq!(engine2.encrypt_document(&doc).unwrap(), sealed);
        assert_eq!(engine2.decrypt_document(&sealed).unwrap(), doc);
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            field in "[a-z]{1,12}",
            text in ".*",
            number in any::<i64>(),
            flag in any::<bool>(),
        ) {
            let engine = create_test_engine();
            let doc = json!({ field.clone(): text, "n": number, "nested": {"flag": flag} });
            let sealed = engine.encrypt_document(&doc).unwrap();
            prop_assert_eq!(engine.decrypt_document(&sealed).unwrap(), doc);
        }

        #[test]
        fn prop_filter_agrees_with_document(field in "[a-z]{1,12}", text in ".*") {
            let engine = create_test_engine();
            let doc = engine.encrypt_document(&json!({ field.clone(): text.clone() })).unwrap();
            let filter = engine.encrypt_filter(&json!({ field.clone(): text })).unwrap();
            prop_assert_eq!(&doc[&field], &filter[&field]);
        }
    }
}
