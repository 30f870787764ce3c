//! Authenticated request pipeline with single-flight token refresh.
//!
//! Every vault call runs through [`RequestPipeline::invoke`], which binds the
//! transport to the cached access token, runs the caller's operation and, on
//! an `Unauthorized` answer, refreshes the token once and retries once.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::Result;
use crate::response::ResponseEnvelope;
use crate::token::{AccessToken, TokenSource};
use crate::transport::{ApiRequest, Transport};

/// Cached token shared by all callers of one pipeline.
struct AuthState {
    token: Option<AccessToken>,
    /// Bumped on every successful fetch so waiters can tell that a
    /// concurrent refresh already replaced the token they saw.
    generation: u64,
}

/// Transport bound to one access token.
///
/// Handles are cheap to clone and are handed to the operation passed to
/// [`RequestPipeline::invoke`].
#[derive(Clone)]
pub struct ApiHandle {
    transport: Arc<dyn Transport>,
    token: Option<AccessToken>,
}

impl ApiHandle {
    /// Sends `request` with this handle's token.
    ///
    /// # Errors
    ///
    /// Returns `Error::Connection` if no response was received.
    pub async fn execute(&self, request: &ApiRequest) -> Result<ResponseEnvelope> {
        self.transport.execute(request, self.token.as_ref().map(AccessToken::expose)).await
    }

    /// Whether this handle carries a token.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Runs vault operations with authentication and one retry on rejection.
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenSource>,
    refresh_margin: Duration,
    auth: RwLock<AuthState>,
    /// Serialises refreshes so concurrent rejections share one fetch.
    refresh_lock: Mutex<()>,
}

impl RequestPipeline {
    /// Creates a pipeline. No token is fetched until the first call.
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            transport,
            tokens,
            refresh_margin: Duration::ZERO,
            auth: RwLock::new(AuthState { token: None, generation: 0 }),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Refreshes cached tokens that expire within `margin` before using them.
    #[must_use]
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Runs `operation` with an authenticated handle.
    ///
    /// If the returned envelope translates to `Unauthorized`, the token is
    /// refreshed and `operation` runs a second time; whatever that attempt
    /// returns is final. Other error envelopes are returned untouched for
    /// the decoder.
    ///
    /// # Errors
    ///
    /// Returns the token source's error if no token can be obtained, or the
    /// operation's error (typically `Error::Connection`). Neither is retried.
    pub async fn invoke<F, Fut>(&self, operation: F) -> Result<ResponseEnvelope>
    where
        F: Fn(ApiHandle) -> Fut,
        Fut: Future<Output = Result<ResponseEnvelope>>,
    {
        let (token, generation) = self.current_token().await?;
        let envelope = operation(self.handle(Some(token))).await?;

        if !envelope.to_error().is_some_and(|err| err.is_unauthorized()) {
            return Ok(envelope);
        }

        debug!(generation, "access token rejected, refreshing and retrying once");
        let (token, _) = self.refresh(generation).await?;
        operation(self.handle(Some(token))).await
    }

    /// Runs `operation` without a token. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns the operation's error.
    pub async fn invoke_anonymous<F, Fut>(&self, operation: F) -> Result<ResponseEnvelope>
    where
        F: FnOnce(ApiHandle) -> Fut,
        Fut: Future<Output = Result<ResponseEnvelope>>,
    {
        operation(self.handle(None)).await
    }

    /// Sends one request through [`Self::invoke`].
    ///
    /// # Errors
    ///
    /// See [`Self::invoke`].
    pub async fn send(&self, request: &ApiRequest) -> Result<ResponseEnvelope> {
        debug!(method = %request.method(), path = request.path(), "vault request");
        self.invoke(|api| async move { api.execute(request).await }).await
    }

    /// Sends one request through [`Self::invoke_anonymous`].
    ///
    /// # Errors
    ///
    /// See [`Self::invoke_anonymous`].
    pub async fn send_anonymous(&self, request: &ApiRequest) -> Result<ResponseEnvelope> {
        debug!(method = %request.method(), path = request.path(), "anonymous vault request");
        self.invoke_anonymous(|api| async move { api.execute(request).await }).await
    }

    fn handle(&self, token: Option<AccessToken>) -> ApiHandle {
        ApiHandle { transport: Arc::clone(&self.transport), token }
    }

    /// Returns the cached token, fetching one if absent or about to expire.
    async fn current_token(&self) -> Result<(AccessToken, u64)> {
        let seen = {
            let auth = self.auth.read().await;
            match &auth.token {
                Some(token) if !token.expires_within(self.refresh_margin, Utc::now()) => {
                    return Ok((token.clone(), auth.generation));
                }
                Some(_) => debug!(generation = auth.generation, "access token near expiry"),
                None => {}
            }
            auth.generation
        };
        self.refresh(seen).await
    }

    /// Replaces the token seen at `seen_generation`.
    ///
    /// Callers that queue behind a refresh which already advanced the
    /// generation take its token instead of fetching again.
    async fn refresh(&self, seen_generation: u64) -> Result<(AccessToken, u64)> {
        let _guard = self.refresh_lock.lock().await;

        {
            let auth = self.auth.read().await;
            if auth.generation > seen_generation {
                if let Some(token) = &auth.token {
                    return Ok((token.clone(), auth.generation));
                }
            }
        }

        debug!(generation = seen_generation, "fetching access token");
        let token = self.tokens.fetch_token().await.map_err(|err| {
            warn!(error = %err, "access token refresh failed");
            err
        })?;

        let mut auth = self.auth.write().await;
        auth.token = Some(token.clone());
        auth.generation += 1;
        Ok((token, auth.generation))
    }
}
