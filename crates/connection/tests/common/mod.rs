#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use connection::ConnectionRegistry;
use protocol::{
    ConnectionConfig, ConnectionIdentity, ExecutionMode, SocketTransport, TransportError,
    TransportFactory, WireRequest, WireResponse,
};
use serde_json::json;
use tokio::sync::Notify;

/// In-memory transport that records every request and answers from a script.
///
/// Without a scripted response it answers `200` with the request echoed back
/// as `{method, url, data}`. With `hold` set, each request waits for
/// [`RecordingTransport::release`] before answering.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<WireRequest>>,
    responses: Mutex<VecDeque<WireResponse>>,
    connected: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    hold: AtomicBool,
    released: Notify,
    pub requested: Notify,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond_with(&self, status_code: u16, body: serde_json::Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(WireResponse::new(status_code, body));
    }

    pub fn hold_responses(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.released.notify_waiters();
    }

    pub fn requests(&self) -> Vec<WireRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> WireRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SocketTransport for RecordingTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        if !self.connected.swap(true, Ordering::SeqCst) {
            self.connects.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn request(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        self.connect().await?;
        let released = self.released.notified();
        self.requests.lock().unwrap().push(request.clone());
        self.requested.notify_one();

        if self.hold.load(Ordering::SeqCst) {
            released.await;
        }

        let scripted = self.responses.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| {
            WireResponse::new(
                200,
                json!({"method": request.method, "url": request.url, "data": request.data}),
            )
        }))
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Hands out one [`RecordingTransport`] per identity and keeps them for
/// inspection.
#[derive(Default)]
pub struct RecordingFactory {
    transports: Mutex<HashMap<String, Arc<RecordingTransport>>>,
    created: AtomicUsize,
}

impl RecordingFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn transport(&self, identity: &str) -> Arc<RecordingTransport> {
        self.transports
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .expect("no transport created for identity")
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl TransportFactory for RecordingFactory {
    fn create(
        &self,
        identity: &ConnectionIdentity,
        _config: &ConnectionConfig,
    ) -> Arc<dyn SocketTransport> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let transport = RecordingTransport::new();
        self.transports
            .lock()
            .unwrap()
            .insert(identity.to_string(), Arc::clone(&transport));
        transport
    }
}

pub fn registry(mode: ExecutionMode) -> (ConnectionRegistry, Arc<RecordingFactory>) {
    let factory = RecordingFactory::new();
    let registry = ConnectionRegistry::new(factory.clone(), mode);
    (registry, factory)
}

/// Config with an empty base path so recorded URLs read `/Pet/5`.
pub fn bare_config() -> ConnectionConfig {
    ConnectionConfig {
        base_path: String::new(),
        auto_connect: false,
        ..ConnectionConfig::default()
    }
}
