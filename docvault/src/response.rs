//! Response envelopes and the decoder that turns them into typed results.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::taxonomy;

/// Outcome reported by the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

/// Transport-neutral view of one vault response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status: Status,
    pub status_code: Option<u16>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub payload: Value,
}

impl ResponseEnvelope {
    /// Successful response carrying `payload`.
    #[must_use]
    pub fn ok(status_code: u16, payload: Value) -> Self {
        Self {
            status: Status::Ok,
            status_code: Some(status_code),
            error_code: None,
            error_message: None,
            payload,
        }
    }

    /// Failed response.
    pub fn error(status_code: u16, error_code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            status_code: Some(status_code),
            error_code,
            error_message: Some(message.into()),
            payload: Value::Null,
        }
    }

    /// Builds an envelope from a raw HTTP status and body.
    ///
    /// 2xx responses become `Ok` with the parsed body as payload (an empty
    /// body is `null`). Anything else becomes `Error`; the code and message
    /// are read from `{"error": {"code", "internal_code", "message"}}`, from
    /// a flat `{"code", "message"}` body, or from the raw text.
    #[must_use]
    pub fn from_http(status_code: u16, body: &[u8]) -> Self {
        let parsed = parse_body(body);

        if (200..300).contains(&status_code) {
            return Self::ok(status_code, parsed);
        }

        let (error_code, message) = extract_error(&parsed);
        let message = message.unwrap_or_else(|| match &parsed {
            Value::String(text) => text.clone(),
            Value::Null => format!("request failed with status {status_code}"),
            other => other.to_string(),
        });
        Self::error(status_code, error_code, message)
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Translates an error envelope into its [`Error`]; `None` when ok.
    #[must_use]
    pub fn to_error(&self) -> Option<Error> {
        if self.is_ok() {
            return None;
        }
        Some(taxonomy::translate(
            self.status_code,
            self.error_code.as_deref(),
            self.error_message.as_deref().unwrap_or_default(),
        ))
    }
}

fn parse_body(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

fn extract_error(body: &Value) -> (Option<String>, Option<String>) {
    let detail = match body.get("error") {
        Some(nested) if nested.is_object() => nested,
        Some(Value::String(message)) => return (None, Some(message.clone())),
        _ => body,
    };

    // internal_code is the service-specific code; code is usually the status
    let code = ["internal_code", "error_code", "code"]
        .iter()
        .filter_map(|key| detail.get(*key))
        .find_map(code_text);
    let message = detail.get("message").and_then(Value::as_str).map(str::to_string);
    (code, message)
}

fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Applies `deserialize` to a successful envelope.
///
/// An error envelope is translated without calling `deserialize`.
///
/// # Errors
///
/// Returns the translated error for error envelopes, or
/// `Error::MalformedResponse` if `deserialize` fails.
pub fn decode<T, F>(envelope: ResponseEnvelope, deserialize: F) -> Result<T>
where
    F: FnOnce(Value) -> std::result::Result<T, serde_json::Error>,
{
    if let Some(err) = envelope.to_error() {
        return Err(err);
    }
    deserialize(envelope.payload).map_err(Error::from)
}

/// Deserializes the payload of a successful envelope into `T`.
///
/// # Errors
///
/// See [`decode`].
pub fn decode_as<T: DeserializeOwned>(envelope: ResponseEnvelope) -> Result<T> {
    decode(envelope, serde_json::from_value)
}

/// Checks that the envelope is successful and discards the payload.
///
/// # Errors
///
/// Returns the translated error for error envelopes.
pub fn decode_unit(envelope: ResponseEnvelope) -> Result<()> {
    decode(envelope, |_| Ok(()))
}
