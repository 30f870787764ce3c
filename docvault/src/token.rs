//! Access tokens and the sources that issue them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::error::Result;

/// Opaque bearer credential with an optional expiry.
#[derive(Debug)]
pub struct AccessToken {
    token: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token without a known expiry.
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: SecretString::new(token.into()), expires_at: None }
    }

    /// Sets the expiry instant.
    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns the raw bearer value.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }

    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the token is expired, or expires within `margin` of `now`.
    ///
    /// A token without expiry never expires on its own; it is only replaced
    /// after the vault rejects it.
    #[must_use]
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| (at - now).to_std().map_or(true, |left| left <= margin))
    }
}

impl Clone for AccessToken {
    fn clone(&self) -> Self {
        Self {
            token: SecretString::new(self.token.expose_secret().clone()),
            expires_at: self.expires_at,
        }
    }
}

/// Issues access tokens for the request pipeline.
///
/// `fetch_token` is called lazily on first use and again on every refresh.
/// The pipeline guarantees at most one call in flight at a time.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtains a fresh access token.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unauthorized` if the identity can no longer be
    /// authenticated, or `Error::Connection` if the issuer is unreachable.
    async fn fetch_token(&self) -> Result<AccessToken>;
}

/// Token source handing out one pre-issued token.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: AccessToken,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: AccessToken::new(token) }
    }

    /// Wraps an existing token, expiry included.
    #[must_use]
    pub fn from_token(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn fetch_token(&self) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_token_without_expiry_never_expires() {
        let token = AccessToken::new("abc");
        assert!(!token.expires_within(Duration::from_secs(3600), Utc::now()));
    }

    #[test]
    fn test_expiry_margin() {
        let now = Utc::now();
        let token = AccessToken::new("abc").with_expiry(now + TimeDelta::seconds(30));

        assert!(token.expires_within(Duration::from_secs(60), now));
        assert!(!token.expires_within(Duration::from_secs(10), now));
    }

    #[test]
    fn test_past_expiry() {
        let now = Utc::now();
        let token = AccessToken::new("abc").with_expiry(now - TimeDelta::seconds(1));
        assert!(token.expires_within(Duration::ZERO, now));
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AccessToken::new("super-secret-token");
        assert!(!format!("{token:?}").contains("super-secret-token"));
        assert_eq!(token.expose(), "super-secret-token");
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticTokenSource::new("abc");
        assert_eq!(source.fetch_token().await.unwrap().expose(), "abc");
    }
}
