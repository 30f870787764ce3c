//! Translation of vault-side failures into [`Error`] values.
//!
//! The server error code is matched first (longest pattern wins), then the
//! HTTP status decides. The table is total: `ClientRequest` and `Server`
//! catch everything the specific rules do not claim.

use crate::error::Error;

/// Server error code patterns, matched as substrings of the normalised code.
const CODE_RULES: &[(&str, Rule)] = &[
    ("COLLECTION_NOT_FOUND", Rule::CollectionNotFound),
    ("COLLECTION_NOT_EXISTS", Rule::CollectionNotFound),
    ("ALREADY_EXISTS", Rule::AlreadyExists),
    ("DUPLICATE", Rule::AlreadyExists),
    ("TOKEN_EXPIRED", Rule::Unauthorized),
    ("INVALID_TOKEN", Rule::Unauthorized),
    ("UNAUTHORIZED", Rule::Unauthorized),
    ("NOT_FOUND", Rule::ByStatus),
    ("NOT_EXISTS", Rule::ByStatus),
];

#[derive(Debug, Clone, Copy)]
enum Rule {
    CollectionNotFound,
    AlreadyExists,
    Unauthorized,
    /// Recognised but generic; the status code decides.
    ByStatus,
}

impl Rule {
    fn into_error(self, message: &str) -> Option<Error> {
        let message = message.to_string();
        match self {
            Self::CollectionNotFound => Some(Error::CollectionNotFound { message }),
            Self::AlreadyExists => Some(Error::AlreadyExists { message }),
            Self::Unauthorized => Some(Error::Unauthorized { message }),
            Self::ByStatus => None,
        }
    }
}

/// Maps a decoded wire failure to exactly one error.
///
/// `status_code` is `None` when no response reached the client.
#[must_use]
pub fn translate(
    status_code: Option<u16>,
    server_error_code: Option<&str>,
    message: &str,
) -> Error {
    let Some(status) = status_code else {
        return Error::Connection(message.to_string());
    };

    if let Some(err) = server_error_code.and_then(match_code).and_then(|r| r.into_error(message)) {
        return err;
    }

    match status {
        401 => Error::Unauthorized { message: message.to_string() },
        409 => Error::AlreadyExists { message: message.to_string() },
        404 if mentions_collection(message) => {
            Error::CollectionNotFound { message: message.to_string() }
        }
        400..=499 => Error::ClientRequest { code: status, message: message.to_string() },
        _ => Error::Server { code: status, message: message.to_string() },
    }
}

fn match_code(code: &str) -> Option<Rule> {
    let normalised = code.trim().to_ascii_uppercase().replace(['-', ' ', '.'], "_");
    if normalised.is_empty() {
        return None;
    }
    CODE_RULES
        .iter()
        .filter(|(pattern, _)| normalised.contains(pattern))
        .max_by_key(|(pattern, _)| pattern.len())
        .map(|(_, rule)| *rule)
}

fn mentions_collection(message: &str) -> bool {
    message.to_ascii_lowercase().contains("collection")
}
