//! Shared fakes for the dispatcher integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use plant_doctor::catalog::MenuCatalog;
use plant_doctor::conversation::{ConversationState, ConversationStore, InMemoryConversationStore};
use plant_doctor::dispatcher::{DispatchSettings, MessageDispatcher};
use plant_doctor::errors::{GatewayError, TransportError};
use plant_doctor::gateway::{InferenceGateway, PredictionResult};
use plant_doctor::readiness::ReadinessGate;
use plant_doctor::transport::{InboundMessage, Transport};

/// Smallest byte sequence `image::guess_format` recognizes as PNG
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, b'I', b'H', b'D', b'R'];

#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub user_id: String,
    pub text: String,
    pub inline: bool,
}

/// Transport that records outbound messages
pub struct FakeTransport {
    sent: Mutex<Vec<Sent>>,
    media: Mutex<Result<Vec<u8>, TransportError>>,
    pub downloads: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            media: Mutex::new(Ok(PNG_BYTES.to_vec())),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn with_media(self, media: Result<Vec<u8>, TransportError>) -> Self {
        *self.media.lock().unwrap() = media;
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts_for(&self, user_id: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.text)
            .collect()
    }

    pub fn last_text(&self) -> String {
        self.sent().last().map(|s| s.text.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_text(&self, user_id: &str, text: &str) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(Sent {
            user_id: user_id.to_string(),
            text: text.to_string(),
            inline: false,
        });
        Ok(())
    }

    async fn download_media(&self, _msg: &InboundMessage) -> Result<Vec<u8>, TransportError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.media.lock().unwrap().clone()
    }

    async fn reply_inline(&self, msg: &InboundMessage, text: &str) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(Sent {
            user_id: msg.sender_id.clone(),
            text: text.to_string(),
            inline: true,
        });
        Ok(())
    }
}

/// How the fake gateway answers
pub enum GatewayBehavior {
    Succeed(PredictionResult),
    Fail(GatewayError),
    /// Never answers
    Hang,
    /// Signals `started`, then waits for `release` before succeeding
    Gated {
        started: Arc<Notify>,
        release: Arc<Notify>,
        result: PredictionResult,
    },
}

pub struct FakeGateway {
    behavior: GatewayBehavior,
    pub calls: Mutex<Vec<(usize, String)>>,
}

impl FakeGateway {
    pub fn new(behavior: GatewayBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceGateway for FakeGateway {
    async fn predict(&self, image: &[u8], subject_key: &str) -> Result<PredictionResult, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((image.len(), subject_key.to_string()));

        match &self.behavior {
            GatewayBehavior::Succeed(result) => Ok(result.clone()),
            GatewayBehavior::Fail(err) => Err(err.clone()),
            GatewayBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::Request("unreachable".to_string()))
            }
            GatewayBehavior::Gated {
                started,
                release,
                result,
            } => {
                started.notify_one();
                release.notified().await;
                Ok(result.clone())
            }
        }
    }
}

pub fn leaf_blight() -> PredictionResult {
    PredictionResult {
        label: "Leaf Blight".to_string(),
        confidence: Some(0.87),
    }
}

pub fn awaiting_tomato() -> ConversationState {
    ConversationState::AwaitingImage {
        subject_key: "tomato".to_string(),
        selector_token: "5".to_string(),
    }
}

pub struct Harness {
    pub dispatcher: MessageDispatcher,
    pub store: Arc<InMemoryConversationStore>,
    pub transport: Arc<FakeTransport>,
    pub gateway: Arc<FakeGateway>,
    pub readiness: ReadinessGate,
}

impl Harness {
    pub fn new(behavior: GatewayBehavior) -> Self {
        Self::build(FakeTransport::new(), behavior, DispatchSettings::default(), ReadinessGate::ready())
    }

    pub fn build(
        transport: FakeTransport,
        behavior: GatewayBehavior,
        settings: DispatchSettings,
        readiness: ReadinessGate,
    ) -> Self {
        plant_doctor::localization::init_localization().expect("Failed to initialize localization");

        let store = Arc::new(InMemoryConversationStore::new());
        let transport = Arc::new(transport);
        let gateway = Arc::new(FakeGateway::new(behavior));
        let dispatcher = MessageDispatcher::new(
            Arc::new(MenuCatalog::default()),
            store.clone(),
            transport.clone(),
            gateway.clone(),
            readiness.clone(),
            settings,
        );

        Self {
            dispatcher,
            store,
            transport,
            gateway,
            readiness,
        }
    }

    /// Handle a message and wait for any background prediction
    pub async fn send(&self, msg: InboundMessage) {
        self.dispatcher.handle(msg).await.finished().await;
    }

    pub async fn state(&self, user_id: &str) -> ConversationState {
        self.store.get(user_id).await.unwrap()
    }

    pub async fn put_state(&self, user_id: &str, state: ConversationState) {
        self.store.set(user_id, state).await.unwrap();
    }
}
