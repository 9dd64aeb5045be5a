//! ChatSession - ties token acquisition, envelope coding and the connection
//! together for one visitor.
//!
//! The session never puts an application frame on the wire without first
//! obtaining a non-expired transaction token through
//! [`TransactionTokenService::valid_token`].

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::domain::auth::{AuthFlowBuilder, ConnectionContext};
use crate::domain::events::{EventEnvelopeRouter, EventPayload, InboundFrame, OutgoingCommand, PushedAccessToken};
use crate::domain::foundation::{ChatError, ThreadId, VisitorId};
use crate::domain::token::{AccessToken, TokenLifecycle, TransactionToken};
use crate::ports::{Connection, KeyValueStore, KeyValueStoreExt, OutboundFrame, StoreKey, TokenEndpoint};

use super::TransactionTokenService;

/// One authenticated chat conversation channel.
pub struct ChatSession {
    context: Arc<ConnectionContext>,
    store: Arc<dyn KeyValueStore>,
    tokens: TransactionTokenService,
    router: EventEnvelopeRouter,
    connection: Arc<dyn Connection>,
}

impl ChatSession {
    /// Creates a session over `connection`.
    ///
    /// The visitor id is taken from `context` when set, otherwise restored
    /// from `store`, otherwise generated; the chosen id is persisted.
    pub fn new(
        mut context: ConnectionContext,
        store: Arc<dyn KeyValueStore>,
        endpoint: Arc<dyn TokenEndpoint>,
        connection: Arc<dyn Connection>,
    ) -> Self {
        let visitor_id = resolve_visitor_id(context.visitor_id, store.as_ref());
        context.visitor_id = Some(visitor_id);

        let context = Arc::new(context);
        let lifecycle = Arc::new(TokenLifecycle::new(store.clone()));
        let tokens = TransactionTokenService::new(
            AuthFlowBuilder::new(context.clone()),
            endpoint,
            lifecycle,
            context.authentication_mode,
        );

        tracing::info!(
            brand_id = context.brand_id,
            channel_id = %context.channel_id,
            visitor_id = %visitor_id,
            mode = %context.authentication_mode,
            "Chat session created"
        );

        Self {
            router: EventEnvelopeRouter::new(context.clone()),
            context,
            store,
            tokens,
            connection,
        }
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    pub fn tokens(&self) -> &TransactionTokenService {
        &self.tokens
    }

    /// Obtains a valid token and authorizes the customer on the socket.
    pub async fn authorize(&self, cancel: &CancellationToken) -> Result<TransactionToken, ChatError> {
        let token = self.tokens.valid_token(cancel).await?;

        let command = OutgoingCommand::AuthorizeCustomer {
            authorization_code: self.context.authorization_code().map(str::to_owned),
            code_verifier: self.context.code_verifier().map(str::to_owned),
        };
        self.transmit(&command, &token).await?;

        Ok(token)
    }

    /// Encodes `command` with a valid token and queues it on the connection.
    ///
    /// # Errors
    ///
    /// Token acquisition errors, encoding errors, and connection failures.
    pub async fn send(&self, command: OutgoingCommand, cancel: &CancellationToken) -> Result<(), ChatError> {
        let token = self.tokens.valid_token(cancel).await?;
        self.transmit(&command, &token).await
    }

    /// Sends the keep-alive frame on the priority lane.
    pub async fn send_heartbeat(&self) -> Result<(), ChatError> {
        let frame = self.router.encode_heartbeat();
        self.connection.send(OutboundFrame::Heartbeat(frame)).await
    }

    /// Receives and decodes the next inbound frame.
    ///
    /// Token pushes update the stored token and recovered threads are cached
    /// before the frame is handed to the caller.
    pub async fn receive(&self) -> Result<InboundFrame, ChatError> {
        let bytes = self.connection.receive().await?;
        let frame = self.router.decode(&bytes)?;

        if let InboundFrame::Event(envelope) = &frame {
            self.apply(&envelope.payload);
        }

        Ok(frame)
    }

    /// Thread id remembered from the last recovered thread.
    pub fn cached_thread_id(&self) -> Option<ThreadId> {
        self.store.get(StoreKey::CachedThreadIdOnExternalPlatform)
    }

    /// Forgets everything persisted for this visitor, including the token.
    pub fn sign_out(&self) {
        self.tokens.lifecycle().clear();
        self.store.purge();
        tracing::info!(visitor_id = ?self.context.visitor_id, "Session state purged");
    }

    async fn transmit(&self, command: &OutgoingCommand, token: &TransactionToken) -> Result<(), ChatError> {
        let bytes = self.router.encode_outgoing(command, Some(token))?;
        self.connection.send(OutboundFrame::Application(bytes)).await
    }

    fn apply(&self, payload: &EventPayload) {
        match payload {
            EventPayload::TokenRefreshed { access_token } => self.merge_pushed_token(access_token),
            EventPayload::CustomerAuthorized {
                access_token: Some(access_token),
                ..
            } => self.merge_pushed_token(access_token),
            EventPayload::ThreadRecovered { thread, .. } => {
                self.store.set(
                    StoreKey::CachedThreadIdOnExternalPlatform,
                    Some(&thread.id_on_external_platform),
                );
            }
            _ => {}
        }
    }

    fn merge_pushed_token(&self, pushed: &PushedAccessToken) {
        let merged = self.tokens.lifecycle().update(|current| {
            let refresh_token = current.refresh_token().unwrap_or_default().to_owned();
            Some(current.copy_with_access_token(AccessToken::new(pushed.token.clone(), refresh_token)))
        });

        match merged {
            Some(_) => tracing::debug!(expires_in = pushed.expires_in, "Applied pushed access token"),
            None => tracing::debug!("Ignoring pushed access token without a transaction token"),
        }
    }
}

fn resolve_visitor_id(configured: Option<VisitorId>, store: &dyn KeyValueStore) -> VisitorId {
    let visitor_id = configured
        .or_else(|| store.get(StoreKey::VisitorId))
        .unwrap_or_else(VisitorId::new);

    store.set(StoreKey::VisitorId, Some(&visitor_id));
    visitor_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::connection::{ChannelConnection, ChannelTransport};
    use crate::adapters::storage::InMemoryKeyValueStore;
    use crate::domain::auth::{ChatEnvironment, TokenRequest};
    use crate::domain::foundation::{AuthenticationMode, CustomerIdentity, Timestamp};
    use crate::domain::messages::{MessageContent, Thread};
    use crate::domain::events::SendMessage;
    use crate::ports::HttpReply;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEndpoint {
        body: String,
        calls: AtomicUsize,
    }

    impl FixedEndpoint {
        fn new(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: body.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TokenEndpoint for FixedEndpoint {
        async fn post(&self, _request: &TokenRequest) -> Result<HttpReply, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HttpReply::new(200, self.body.as_bytes()))
        }
    }

    const TOKEN_BODY: &str = r#"{"accessToken":"tx","expiresIn":600}"#;

    fn context(mode: AuthenticationMode) -> ConnectionContext {
        ConnectionContext::new(
            7,
            "chat_7",
            mode,
            ChatEnvironment::new("https://channels-eu1.example.com/chat", "wss://socket", None, None),
        )
        .with_customer(CustomerIdentity::new("customer-1"))
    }

    fn session_with(
        ctx: ConnectionContext,
        store: Arc<InMemoryKeyValueStore>,
        endpoint: Arc<FixedEndpoint>,
    ) -> (ChatSession, ChannelTransport) {
        let (connection, transport) = ChannelConnection::pair(8);
        (ChatSession::new(ctx, store, endpoint, Arc::new(connection)), transport)
    }

    async fn next_json(transport: &mut ChannelTransport) -> Value {
        let frame = transport.next_outbound().await.unwrap();
        serde_json::from_slice(frame.bytes()).unwrap()
    }

    #[test]
    fn visitor_id_is_generated_and_persisted() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let (session, _transport) = session_with(context(AuthenticationMode::Anonymous), store.clone(), FixedEndpoint::new(TOKEN_BODY));

        let visitor_id = session.context().visitor_id.unwrap();
        assert_eq!(store.get::<VisitorId>(StoreKey::VisitorId), Some(visitor_id));
    }

    #[test]
    fn persisted_visitor_id_is_reused() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let existing = VisitorId::new();
        store.set(StoreKey::VisitorId, Some(&existing));

        let (session, _transport) = session_with(context(AuthenticationMode::Anonymous), store, FixedEndpoint::new(TOKEN_BODY));

        assert_eq!(session.context().visitor_id, Some(existing));
    }

    #[tokio::test]
    async fn authorize_fetches_token_and_sends_authorize_command() {
        let endpoint = FixedEndpoint::new(TOKEN_BODY);
        let (session, mut transport) = session_with(
            context(AuthenticationMode::Anonymous),
            Arc::new(InMemoryKeyValueStore::new()),
            endpoint.clone(),
        );

        let token = session.authorize(&CancellationToken::new()).await.unwrap();
        assert_eq!(token.value, "tx");

        let sent = next_json(&mut transport).await;
        assert_eq!(sent["payload"]["eventType"], "AuthorizeCustomer");
        assert_eq!(sent["payload"]["brand"]["id"], 7);
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn send_reuses_valid_token() {
        let endpoint = FixedEndpoint::new(TOKEN_BODY);
        let (session, mut transport) = session_with(
            context(AuthenticationMode::Anonymous),
            Arc::new(InMemoryKeyValueStore::new()),
            endpoint.clone(),
        );
        let cancel = CancellationToken::new();
        let thread = Thread::new(ThreadId::new());

        session
            .send(OutgoingCommand::SendMessage(Box::new(SendMessage::new(thread.clone(), MessageContent::text("hi")))), &cancel)
            .await
            .unwrap();
        session.send(OutgoingCommand::ArchiveThread { thread }, &cancel).await.unwrap();

        assert_eq!(next_json(&mut transport).await["payload"]["eventType"], "SendMessage");
        assert_eq!(next_json(&mut transport).await["payload"]["eventType"], "ArchiveThread");
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_token_is_replaced_before_sending() {
        let endpoint = FixedEndpoint::new(r#"{"accessToken":"tx","expiresIn":600,"thirdParty":{"token":"oauth","refreshToken":"r"}}"#);
        let store = Arc::new(InMemoryKeyValueStore::new());
        store.set(
            StoreKey::TransactionToken,
            Some(
                &TransactionToken::new("stale", 600)
                    .with_created_date(Timestamp::now().minus_secs(3600))
                    .with_access_token(AccessToken::new("old", "r")),
            ),
        );
        let ctx = context(AuthenticationMode::ThirdPartyOAuth).with_oauth_code("code", "verifier");
        let (session, mut transport) = session_with(ctx, store, endpoint.clone());

        let thread = Thread::new(ThreadId::new());
        session
            .send(
                OutgoingCommand::SendMessage(Box::new(SendMessage::new(thread, MessageContent::text("hi")))),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let sent = next_json(&mut transport).await;
        assert_eq!(sent["payload"]["data"]["accessToken"], json!({"token": "oauth"}));
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn heartbeat_goes_out_on_priority_lane() {
        let (session, mut transport) = session_with(
            context(AuthenticationMode::Anonymous),
            Arc::new(InMemoryKeyValueStore::new()),
            FixedEndpoint::new(TOKEN_BODY),
        );

        session.send_heartbeat().await.unwrap();

        assert_eq!(
            transport.next_outbound().await,
            Some(OutboundFrame::Heartbeat(br#"{"action":"heartbeat"}"#.to_vec()))
        );
    }

    #[tokio::test]
    async fn pushed_token_updates_stored_access_token() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let (session, transport) = session_with(
            context(AuthenticationMode::ThirdPartyOAuth),
            store,
            FixedEndpoint::new(TOKEN_BODY),
        );
        session
            .tokens()
            .lifecycle()
            .store(TransactionToken::new("tx", 600).with_access_token(AccessToken::new("old", "refresh")));

        let frame = json!({
            "eventId": "4f2c5e8a-7b1d-4c3e-9a6f-2d8b1e0c5a7f",
            "eventObject": "Customer",
            "eventType": "TokenRefreshed",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "data": {"accessToken": {"token": "pushed", "expiresIn": 300}}
        });
        transport.deliver(serde_json::to_vec(&frame).unwrap()).await.unwrap();

        assert!(matches!(session.receive().await.unwrap(), InboundFrame::Event(_)));
        let current = session.tokens().lifecycle().current().unwrap();
        assert_eq!(current.access_token, Some(AccessToken::new("pushed", "refresh")));
    }

    #[tokio::test]
    async fn pushed_token_without_transaction_token_is_dropped() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let (session, transport) = session_with(
            context(AuthenticationMode::ThirdPartyOAuth),
            store.clone(),
            FixedEndpoint::new(TOKEN_BODY),
        );

        let frame = json!({
            "eventId": "4f2c5e8a-7b1d-4c3e-9a6f-2d8b1e0c5a7f",
            "eventObject": "Customer",
            "eventType": "TokenRefreshed",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "data": {"accessToken": {"token": "pushed", "expiresIn": 300}}
        });
        transport.deliver(serde_json::to_vec(&frame).unwrap()).await.unwrap();

        assert!(matches!(session.receive().await.unwrap(), InboundFrame::Event(_)));
        assert!(session.tokens().lifecycle().current().is_none());
        assert!(store.get::<TransactionToken>(StoreKey::TransactionToken).is_none());
    }

    #[tokio::test]
    async fn recovered_thread_is_cached_and_sign_out_purges() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let (session, transport) = session_with(context(AuthenticationMode::Anonymous), store, FixedEndpoint::new(TOKEN_BODY));
        let thread_id = ThreadId::new();

        let frame = json!({
            "eventId": "4f2c5e8a-7b1d-4c3e-9a6f-2d8b1e0c5a7f",
            "eventObject": "Thread",
            "eventType": "ThreadRecovered",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "data": {"thread": {"idOnExternalPlatform": thread_id}, "messages": []}
        });
        transport.deliver(serde_json::to_vec(&frame).unwrap()).await.unwrap();
        session.receive().await.unwrap();

        assert_eq!(session.cached_thread_id(), Some(thread_id));

        session.sign_out();
        assert_eq!(session.cached_thread_id(), None);
        assert!(session.tokens().lifecycle().current().is_none());
    }

    #[tokio::test]
    async fn heartbeat_frame_is_not_an_event() {
        let (session, transport) = session_with(
            context(AuthenticationMode::Anonymous),
            Arc::new(InMemoryKeyValueStore::new()),
            FixedEndpoint::new(TOKEN_BODY),
        );
        transport.deliver(br#"{"action":"heartbeat"}"#.to_vec()).await.unwrap();

        assert_eq!(session.receive().await.unwrap(), InboundFrame::Heartbeat);
    }
}
