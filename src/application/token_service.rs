//! TransactionTokenService - fetches and refreshes the transaction token.
//!
//! At most one token request and one refresh are in flight per session.
//! Every caller arriving while one of the same kind is outstanding awaits the
//! same shared future instead of issuing a duplicate request. Requests and
//! refreshes use separate slots: a refresh keeps the transaction token's
//! creation date, so a caller that needs an unexpired token never joins one.
//! Each slot holds only a weak handle: when every waiter has gone (cancelled
//! or dropped) the future is dropped with them and nothing is stored.
//!
//! A token reaches `TokenLifecycle` only after the full response decoded and
//! validated, so a cancelled, failed or partial response never replaces the
//! stored token. A refresh merges into the token it started from and is
//! discarded if a newer token was stored meanwhile.

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

use crate::domain::auth::{AuthFlowBuilder, TokenRequest};
use crate::domain::foundation::{AuthenticationMode, ChatError};
use crate::domain::token::{AccessToken, TokenLifecycle, TransactionToken};
use crate::ports::TokenEndpoint;

type TokenFuture = BoxFuture<'static, Result<TransactionToken, ChatError>>;

/// Obtains transaction tokens from the token server.
pub struct TransactionTokenService {
    builder: AuthFlowBuilder,
    endpoint: Arc<dyn TokenEndpoint>,
    lifecycle: Arc<TokenLifecycle>,
    mode: AuthenticationMode,
    request_inflight: InflightSlot,
    refresh_inflight: InflightSlot,
}

type InflightSlot = Mutex<Option<WeakShared<TokenFuture>>>;

impl TransactionTokenService {
    pub fn new(
        builder: AuthFlowBuilder,
        endpoint: Arc<dyn TokenEndpoint>,
        lifecycle: Arc<TokenLifecycle>,
        mode: AuthenticationMode,
    ) -> Self {
        Self {
            builder,
            endpoint,
            lifecycle,
            mode,
            request_inflight: Mutex::new(None),
            refresh_inflight: Mutex::new(None),
        }
    }

    pub fn lifecycle(&self) -> &Arc<TokenLifecycle> {
        &self.lifecycle
    }

    /// Requests a new transaction token for the session's mode and stores it.
    ///
    /// # Errors
    ///
    /// - Validation errors from [`AuthFlowBuilder`], before any network call
    /// - `TransactionTokenRequestFailed` for a status outside `200..=299`
    /// - `InvalidData` for an undecodable or invalid response
    /// - `ProtocolError` for transport failures
    /// - `Cancelled` when `cancel` fires first
    pub async fn request_token(&self, cancel: &CancellationToken) -> Result<TransactionToken, ChatError> {
        let shared = join_or_start(&self.request_inflight, || {
            let request = self.builder.build_token_request(self.mode)?;
            tracing::debug!(mode = %self.mode, "Requesting transaction token");
            Ok(fetch_token(self.endpoint.clone(), self.lifecycle.clone(), request).boxed())
        })?;

        await_or_cancel(shared, cancel).await
    }

    /// Exchanges the stored OAuth refresh token for a new access token and
    /// stores the current token carrying it.
    ///
    /// # Errors
    ///
    /// `MissingParameter("refreshToken")` without a stored refresh token, plus
    /// the failures of [`Self::request_token`].
    pub async fn refresh_access_token(&self, cancel: &CancellationToken) -> Result<TransactionToken, ChatError> {
        let shared = join_or_start(&self.refresh_inflight, || {
            let current = self.lifecycle.current();
            let request = self.builder.build_refresh_request(current.as_ref())?;
            let current = current.ok_or_else(|| ChatError::missing_parameter("refreshToken"))?;
            tracing::debug!("Refreshing access token");
            Ok(refresh_token(self.endpoint.clone(), self.lifecycle.clone(), request, current).boxed())
        })?;

        await_or_cancel(shared, cancel).await
    }

    /// Returns the stored token while it is valid, otherwise requests a new
    /// one, joining an outstanding request but never a refresh.
    pub async fn valid_token(&self, cancel: &CancellationToken) -> Result<TransactionToken, ChatError> {
        if let Some(token) = self.lifecycle.valid() {
            return Ok(token);
        }

        tracing::debug!("Transaction token missing or expired");
        self.request_token(cancel).await
    }
}

/// Joins the future outstanding in `slot`, or starts the one built by `start`.
fn join_or_start<F>(slot: &InflightSlot, start: F) -> Result<Shared<TokenFuture>, ChatError>
where
    F: FnOnce() -> Result<TokenFuture, ChatError>,
{
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(existing) = slot.as_ref().and_then(WeakShared::upgrade) {
        if existing.peek().is_none() {
            tracing::debug!("Joining in-flight token request");
            return Ok(existing);
        }
    }

    let shared = start()?.shared();
    *slot = shared.downgrade();
    Ok(shared)
}

async fn await_or_cancel(
    shared: Shared<TokenFuture>,
    cancel: &CancellationToken,
) -> Result<TransactionToken, ChatError> {
    tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            tracing::debug!("Token request cancelled by caller");
            Err(ChatError::Cancelled)
        }
        result = shared => result,
    }
}

async fn post_checked(endpoint: &dyn TokenEndpoint, request: &TokenRequest) -> Result<Vec<u8>, ChatError> {
    let reply = endpoint.post(request).await?;

    if !reply.is_success() {
        tracing::warn!(status = reply.status, "Transaction token request failed");
        return Err(ChatError::TransactionTokenRequestFailed {
            status_code: reply.status,
        });
    }

    Ok(reply.body)
}

async fn fetch_token(
    endpoint: Arc<dyn TokenEndpoint>,
    lifecycle: Arc<TokenLifecycle>,
    request: TokenRequest,
) -> Result<TransactionToken, ChatError> {
    let body = post_checked(endpoint.as_ref(), &request).await?;
    let token = TransactionToken::from_response(&body)?;

    lifecycle.store(token.clone());
    tracing::debug!(expires_in = token.expires_in, "Transaction token received");
    Ok(token)
}

async fn refresh_token(
    endpoint: Arc<dyn TokenEndpoint>,
    lifecycle: Arc<TokenLifecycle>,
    request: TokenRequest,
    original: TransactionToken,
) -> Result<TransactionToken, ChatError> {
    let body = post_checked(endpoint.as_ref(), &request).await?;
    let access_token = AccessToken::from_response(&body)?;

    let latest = lifecycle.update(|latest| {
        if latest.value == original.value {
            Some(latest.copy_with_access_token(access_token))
        } else {
            tracing::debug!("Discarding refresh superseded by a newer transaction token");
            None
        }
    });

    let latest = latest.ok_or_else(|| ChatError::missing_parameter("transactionToken"))?;
    tracing::debug!("Access token refreshed");
    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryKeyValueStore;
    use crate::domain::auth::{ChatEnvironment, ConnectionContext};
    use crate::domain::foundation::{Expirable, Timestamp, VisitorId};
    use crate::ports::HttpReply;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Endpoint that counts calls and can hold replies until released.
    struct MockEndpoint {
        calls: AtomicUsize,
        reply: Mutex<Result<HttpReply, ChatError>>,
        refresh_reply: Option<HttpReply>,
        gate: Option<Arc<Notify>>,
        bodies: Mutex<Vec<serde_json::Value>>,
    }

    impl MockEndpoint {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Mutex::new(Ok(HttpReply::new(status, body.as_bytes()))),
                refresh_reply: None,
                gate: None,
                bodies: Mutex::new(Vec::new()),
            }
        }

        /// Answers refresh-grant requests with `body`, others with the default reply.
        fn refreshing_with(mut self, body: &str) -> Self {
            self.refresh_reply = Some(HttpReply::new(200, body.as_bytes()));
            self
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenEndpoint for MockEndpoint {
        async fn post(&self, request: &TokenRequest) -> Result<HttpReply, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies.lock().unwrap().push(request.body.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let is_refresh = request.body["thirdParty"]["grant_type"] == "refresh_token";
            match &self.refresh_reply {
                Some(reply) if is_refresh => Ok(reply.clone()),
                _ => self.reply.lock().unwrap().clone(),
            }
        }
    }

    const TOKEN_BODY: &str = r#"{"accessToken":"fresh","expiresIn":600}"#;

    fn context(mode: AuthenticationMode) -> Arc<ConnectionContext> {
        Arc::new(
            ConnectionContext::new(
                1,
                "chat_1",
                mode,
                ChatEnvironment::new("https://channels-eu1.example.com/chat", "wss://socket", None, None),
            )
            .with_visitor_id(VisitorId::new())
            .with_oauth_code("code", "verifier"),
        )
    }

    fn service(endpoint: Arc<MockEndpoint>, mode: AuthenticationMode) -> TransactionTokenService {
        let lifecycle = Arc::new(TokenLifecycle::new(Arc::new(InMemoryKeyValueStore::new())));
        TransactionTokenService::new(AuthFlowBuilder::new(context(mode)), endpoint, lifecycle, mode)
    }

    #[tokio::test]
    async fn request_token_stores_decoded_token() {
        let endpoint = Arc::new(MockEndpoint::replying(200, TOKEN_BODY));
        let service = service(endpoint.clone(), AuthenticationMode::Anonymous);

        let token = service.request_token(&CancellationToken::new()).await.unwrap();

        assert_eq!(token.value, "fresh");
        assert_eq!(service.lifecycle().current().unwrap().value, "fresh");
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn non_success_status_fails_and_keeps_previous_token() {
        let endpoint = Arc::new(MockEndpoint::replying(503, "unavailable"));
        let service = service(endpoint, AuthenticationMode::Anonymous);
        service.lifecycle().store(TransactionToken::new("previous", 600));

        let err = service.request_token(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(err, ChatError::TransactionTokenRequestFailed { status_code: 503 });
        assert_eq!(service.lifecycle().current().unwrap().value, "previous");
    }

    #[tokio::test]
    async fn undecodable_response_keeps_previous_token() {
        let endpoint = Arc::new(MockEndpoint::replying(200, r#"{"accessToken":"trunc"#));
        let service = service(endpoint, AuthenticationMode::Anonymous);
        service.lifecycle().store(TransactionToken::new("previous", 600));

        let err = service.request_token(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, ChatError::InvalidData(_)));
        assert_eq!(service.lifecycle().current().unwrap().value, "previous");
    }

    #[tokio::test]
    async fn validation_failure_never_reaches_the_network() {
        let endpoint = Arc::new(MockEndpoint::replying(200, TOKEN_BODY));
        let lifecycle = Arc::new(TokenLifecycle::new(Arc::new(InMemoryKeyValueStore::new())));
        let ctx = ConnectionContext::new(
            1,
            "chat_1",
            AuthenticationMode::ThirdPartyOAuth,
            ChatEnvironment::new("https://channels-eu1.example.com/chat", "wss://socket", None, None),
        )
        .with_visitor_id(VisitorId::new());
        let service = TransactionTokenService::new(
            AuthFlowBuilder::new(Arc::new(ctx)),
            endpoint.clone(),
            lifecycle,
            AuthenticationMode::ThirdPartyOAuth,
        );

        let err = service.request_token(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(err, ChatError::missing_parameter("authorizationCode"));
        assert_eq!(endpoint.calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_network_call() {
        let gate = Arc::new(Notify::new());
        let endpoint = Arc::new(MockEndpoint::replying(200, TOKEN_BODY).gated(gate.clone()));
        let service = Arc::new(service(endpoint.clone(), AuthenticationMode::Anonymous));

        let first = tokio::spawn({
            let service = service.clone();
            async move { service.request_token(&CancellationToken::new()).await }
        });
        let second = tokio::spawn({
            let service = service.clone();
            async move { service.request_token(&CancellationToken::new()).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        gate.notify_one();

        let a = first.await.unwrap().unwrap();
        let b = second.await.unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn sequential_requests_each_reach_the_network() {
        let endpoint = Arc::new(MockEndpoint::replying(200, TOKEN_BODY));
        let service = service(endpoint.clone(), AuthenticationMode::Anonymous);

        service.request_token(&CancellationToken::new()).await.unwrap();
        service.request_token(&CancellationToken::new()).await.unwrap();

        assert_eq!(endpoint.calls(), 2);
    }

    #[tokio::test]
    async fn cancelled_request_leaves_stored_token_untouched() {
        let gate = Arc::new(Notify::new());
        let endpoint = Arc::new(MockEndpoint::replying(200, TOKEN_BODY).gated(gate.clone()));
        let service = Arc::new(service(endpoint.clone(), AuthenticationMode::Anonymous));
        service.lifecycle().store(TransactionToken::new("previous", 600));

        let cancel = CancellationToken::new();
        let pending = tokio::spawn({
            let service = service.clone();
            let cancel = cancel.clone();
            async move { service.request_token(&cancel).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        assert_eq!(pending.await.unwrap().unwrap_err(), ChatError::Cancelled);

        // The abandoned request was dropped; releasing the gate stores nothing.
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(service.lifecycle().current().unwrap().value, "previous");
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn valid_token_reuses_stored_token() {
        let endpoint = Arc::new(MockEndpoint::replying(200, TOKEN_BODY));
        let service = service(endpoint.clone(), AuthenticationMode::Anonymous);
        service.lifecycle().store(TransactionToken::new("stored", 600));

        let token = service.valid_token(&CancellationToken::new()).await.unwrap();

        assert_eq!(token.value, "stored");
        assert_eq!(endpoint.calls(), 0);
    }

    #[tokio::test]
    async fn valid_token_replaces_expired_token() {
        let endpoint = Arc::new(MockEndpoint::replying(200, TOKEN_BODY));
        let service = service(endpoint.clone(), AuthenticationMode::Anonymous);
        service
            .lifecycle()
            .store(TransactionToken::new("stale", 600).with_created_date(Timestamp::now().minus_secs(580)));

        let token = service.valid_token(&CancellationToken::new()).await.unwrap();

        assert_eq!(token.value, "fresh");
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn refresh_merges_new_access_token() {
        let endpoint = Arc::new(MockEndpoint::replying(200, r#"{"token":"new","refreshToken":"new-refresh"}"#));
        let service = service(endpoint.clone(), AuthenticationMode::ThirdPartyOAuth);
        let created = Timestamp::now();
        service.lifecycle().store(
            TransactionToken::new("transaction", 600)
                .with_created_date(created)
                .with_access_token(AccessToken::new("old", "old-refresh")),
        );

        let refreshed = service.refresh_access_token(&CancellationToken::new()).await.unwrap();

        assert_eq!(refreshed.value, "transaction");
        assert_eq!(refreshed.created_date, created);
        assert_eq!(refreshed.access_token, Some(AccessToken::new("new", "new-refresh")));
        assert_eq!(service.lifecycle().current().unwrap(), refreshed);
        assert_eq!(
            endpoint.bodies.lock().unwrap()[0],
            serde_json::json!({"thirdParty": {"grant_type": "refresh_token", "refresh_token": "old-refresh"}})
        );
    }

    #[tokio::test]
    async fn valid_token_does_not_join_pending_refresh_of_expired_token() {
        let gate = Arc::new(Notify::new());
        let endpoint = Arc::new(
            MockEndpoint::replying(200, TOKEN_BODY)
                .refreshing_with(r#"{"token":"new","refreshToken":"r2"}"#)
                .gated(gate.clone()),
        );
        let service = Arc::new(service(endpoint.clone(), AuthenticationMode::ThirdPartyOAuth));
        service.lifecycle().store(
            TransactionToken::new("stale", 600)
                .with_created_date(Timestamp::now().minus_secs(900))
                .with_access_token(AccessToken::new("old", "r1")),
        );

        let refresh = tokio::spawn({
            let service = service.clone();
            async move { service.refresh_access_token(&CancellationToken::new()).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let valid = tokio::spawn({
            let service = service.clone();
            async move { service.valid_token(&CancellationToken::new()).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(endpoint.calls(), 2);
        gate.notify_waiters();

        let token = valid.await.unwrap().unwrap();
        assert_eq!(token.value, "fresh");
        assert!(!token.is_expired());
        refresh.await.unwrap().unwrap();
        assert_eq!(service.lifecycle().current().unwrap().value, "fresh");
    }

    #[tokio::test]
    async fn refresh_finishing_after_newer_token_keeps_the_newer_token() {
        let gate = Arc::new(Notify::new());
        let endpoint = Arc::new(
            MockEndpoint::replying(200, r#"{"token":"new","refreshToken":"r2"}"#).gated(gate.clone()),
        );
        let service = Arc::new(service(endpoint.clone(), AuthenticationMode::ThirdPartyOAuth));
        service
            .lifecycle()
            .store(TransactionToken::new("original", 600).with_access_token(AccessToken::new("old", "r1")));

        let refresh = tokio::spawn({
            let service = service.clone();
            async move { service.refresh_access_token(&CancellationToken::new()).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        service.lifecycle().store(TransactionToken::new("newer", 600));
        gate.notify_one();

        let result = refresh.await.unwrap().unwrap();
        assert_eq!(result.value, "newer");
        assert!(result.access_token.is_none());
        assert_eq!(service.lifecycle().current().unwrap().value, "newer");
    }

    #[tokio::test]
    async fn refresh_after_sign_out_does_not_resurrect_token() {
        let gate = Arc::new(Notify::new());
        let endpoint = Arc::new(
            MockEndpoint::replying(200, r#"{"token":"new","refreshToken":"r2"}"#).gated(gate.clone()),
        );
        let service = Arc::new(service(endpoint.clone(), AuthenticationMode::ThirdPartyOAuth));
        service
            .lifecycle()
            .store(TransactionToken::new("original", 600).with_access_token(AccessToken::new("old", "r1")));

        let refresh = tokio::spawn({
            let service = service.clone();
            async move { service.refresh_access_token(&CancellationToken::new()).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        service.lifecycle().clear();
        gate.notify_one();

        let err = refresh.await.unwrap().unwrap_err();
        assert_eq!(err, ChatError::missing_parameter("transactionToken"));
        assert!(service.lifecycle().current().is_none());
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_fails_before_network() {
        let endpoint = Arc::new(MockEndpoint::replying(200, "{}"));
        let service = service(endpoint.clone(), AuthenticationMode::ThirdPartyOAuth);

        let err = service.refresh_access_token(&CancellationToken::new()).await.unwrap_err();

        assert_eq!(err, ChatError::missing_parameter("refreshToken"));
        assert_eq!(endpoint.calls(), 0);
    }
}
