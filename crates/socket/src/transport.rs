//! [`SocketTransport`] over a WebSocket.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use protocol::{
    ConnectionConfig, ConnectionIdentity, Protocol, SocketTransport, TransportError,
    TransportFactory, WireRequest, WireResponse,
};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::codec::{self, RequestFrame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<Mutex<HashMap<Uuid, oneshot::Sender<WireResponse>>>>;

/// Returns the WebSocket URL for a connection: `ws://` for `http`, `wss://`
/// for `https`.
pub fn websocket_url(config: &ConnectionConfig) -> String {
    let scheme = match config.protocol {
        Protocol::Http => "ws",
        Protocol::Https => "wss",
    };
    format!("{scheme}://{}:{}", config.host, config.port)
}

/// An open socket: the write half plus the task draining the read half.
struct Session {
    sink: SplitSink<WsStream, Message>,
    reader: JoinHandle<()>,
}

/// Removes a request's waiter when its future finishes or is dropped.
struct PendingEntry<'a> {
    pending: &'a PendingMap,
    id: Uuid,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(&self.id);
    }
}

/// A persistent WebSocket carrying JSON request/response frames.
///
/// Requests are written under a lock but awaited outside it, so any number
/// can be in flight. A reader task routes each response to its waiter by
/// correlation id. If the server drops the socket, the next request opens a
/// fresh one; after [`SocketTransport::disconnect`] the transport refuses all
/// further work.
///
/// The handshake runs outside the session lock and is abandoned as soon as
/// `disconnect` is called, so a server that never answers cannot hold up
/// teardown.
pub struct WebSocketTransport {
    url: String,
    headers: BTreeMap<String, String>,
    session: tokio::sync::Mutex<Option<Session>>,
    /// Serialises handshakes; never taken by `disconnect`.
    connecting: tokio::sync::Mutex<()>,
    pending: PendingMap,
    connected: Arc<AtomicBool>,
    shut_down: watch::Sender<bool>,
}

impl std::fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("url", &self.url)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>, headers: BTreeMap<String, String>) -> Self {
        let (shut_down, _) = watch::channel(false);
        Self {
            url: url.into(),
            headers,
            session: tokio::sync::Mutex::new(None),
            connecting: tokio::sync::Mutex::new(()),
            pending: Arc::new(Mutex::new(HashMap::new())),
            connected: Arc::new(AtomicBool::new(false)),
            shut_down,
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(websocket_url(config), config.headers.clone())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn is_shut_down(&self) -> bool {
        *self.shut_down.borrow()
    }

    /// Makes sure a live session is installed, opening one if needed.
    async fn ensure_open(&self) -> Result<(), TransportError> {
        let _connecting = self.connecting.lock().await;
        {
            let mut slot = self.session.lock().await;
            if self.is_shut_down() {
                return Err(TransportError::NotConnected);
            }
            match slot.as_ref() {
                Some(session) if !session.reader.is_finished() => return Ok(()),
                Some(_) => {
                    debug!(url = %self.url, "socket was closed by the server; reopening");
                    *slot = None;
                }
                None => {}
            }
        }

        let session = self.open().await?;

        let mut slot = self.session.lock().await;
        if self.is_shut_down() {
            session.reader.abort();
            self.connected.store(false, Ordering::SeqCst);
            return Err(TransportError::NotConnected);
        }
        *slot = Some(session);
        Ok(())
    }

    async fn open(&self) -> Result<Session, TransportError> {
        let mut shut_down = self.shut_down.subscribe();
        let handshake = tokio::select! {
            result = connect_async(self.url.as_str()) => result,
            _ = wait_shut_down(&mut shut_down) => {
                debug!(url = %self.url, "handshake abandoned by disconnect");
                return Err(TransportError::NotConnected);
            }
        };
        let (stream, _) = handshake.map_err(|e| TransportError::Connect {
            url: self.url.clone(),
            message: e.to_string(),
        })?;
        let (sink, stream) = stream.split();
        self.connected.store(true, Ordering::SeqCst);
        info!(url = %self.url, "socket opened");

        let reader = tokio::spawn(read_loop(
            stream,
            Arc::clone(&self.pending),
            Arc::clone(&self.connected),
            self.url.clone(),
        ));
        Ok(Session { sink, reader })
    }
}

#[async_trait]
impl SocketTransport for WebSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.ensure_open().await
    }

    async fn request(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let id = Uuid::new_v4();
        let frame = codec::encode_request(&RequestFrame::new(id, request, self.headers.clone()))?;
        let (tx, rx) = oneshot::channel();

        self.ensure_open().await?;
        let _entry = {
            let mut session = self.session.lock().await;
            let active = session.as_mut().ok_or(TransportError::NotConnected)?;
            lock(&self.pending).insert(id, tx);
            let entry = PendingEntry {
                pending: &self.pending,
                id,
            };
            if active.reader.is_finished() {
                return Err(TransportError::Disconnected);
            }
            if let Err(err) = active.sink.send(Message::Text(frame)).await {
                warn!(url = %self.url, error = %err, "failed to write frame");
                return Err(TransportError::Send(err.to_string()));
            }
            entry
        };

        rx.await.map_err(|_| TransportError::Disconnected)
    }

    async fn disconnect(&self) {
        // Wakes any handshake in progress before the session lock is taken.
        self.shut_down.send_replace(true);
        let session = self.session.lock().await.take();
        if let Some(mut session) = session {
            if let Err(err) = session.sink.close().await {
                debug!(url = %self.url, error = %err, "close handshake failed");
            }
            session.reader.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
        lock(&self.pending).clear();
        info!(url = %self.url, "socket closed");
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

async fn wait_shut_down(shut_down: &mut watch::Receiver<bool>) {
    let _ = shut_down.wait_for(|shut| *shut).await;
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    pending: PendingMap,
    connected: Arc<AtomicBool>,
    url: String,
) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => deliver(&pending, &text),
            Ok(Message::Close(frame)) => {
                debug!(%url, ?frame, "server closed the socket");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(%url, error = %err, "socket read failed");
                break;
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
    // Dropping the senders fails every waiter with `Disconnected`.
    lock(&pending).clear();
}

fn deliver(pending: &PendingMap, text: &str) {
    let frame = match codec::decode_response(text) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(error = %err, "skipping malformed frame");
            return;
        }
    };
    let waiter = lock(pending).remove(&frame.id);
    match waiter {
        Some(tx) => {
            // The waiter may have given up (torn-down connection); that is fine.
            let _ = tx.send(frame.into_response());
        }
        None => debug!(id = %frame.id, "response for unknown request dropped"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------

/// Creates one [`WebSocketTransport`] per registered connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransportFactory;

impl TransportFactory for WebSocketTransportFactory {
    fn create(
        &self,
        identity: &ConnectionIdentity,
        config: &ConnectionConfig,
    ) -> Arc<dyn SocketTransport> {
        let transport = WebSocketTransport::from_config(config);
        debug!(connection = %identity, url = %transport.url(), "websocket transport created");
        Arc::new(transport)
    }
}
