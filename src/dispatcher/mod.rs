//! Dispatcher module driving the per-user menu flow
//!
//! - `transition`: pure decision of next state and actions
//! - `reply`: reply kinds and localized rendering
//!
//! [`MessageDispatcher`] executes decisions: it serializes state changes per
//! user, sends replies, and runs predictions as background tasks so a reset
//! can arrive while the gateway is still busy.

pub mod reply;
pub mod transition;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::catalog::MenuCatalog;
use crate::circuit_breaker::CircuitBreaker;
use crate::config::{BotConfig, RecoveryConfig, DEFAULT_GATEWAY_TIMEOUT_SECS, DEFAULT_LANGUAGE, MAX_IMAGE_BYTES};
use crate::conversation::{ConversationState, ConversationStore};
use crate::errors::{GatewayError, PredictionError, StoreError};
use crate::gateway::{InferenceGateway, PredictionResult};
use crate::localization::language_for;
use crate::media::validate_image_payload;
use crate::readiness::ReadinessGate;
use crate::transport::{InboundMessage, Transport};

pub use reply::Reply;
pub use transition::{decide, Action, Decision};

/// Tunables for the dispatcher
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Bound on waiting for readiness plus the gateway call
    pub gateway_timeout: Duration,
    pub max_image_bytes: usize,
    /// Reply language when the transport reports none
    pub default_language: String,
    pub recovery: RecoveryConfig,
    /// Sender identifier of the bot itself, when known
    pub self_id: Option<String>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            gateway_timeout: Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS),
            max_image_bytes: MAX_IMAGE_BYTES,
            default_language: DEFAULT_LANGUAGE.to_string(),
            recovery: RecoveryConfig::default(),
            self_id: None,
        }
    }
}

impl From<&BotConfig> for DispatchSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            gateway_timeout: config.gateway.timeout(),
            max_image_bytes: config.max_image_bytes,
            default_language: config.default_language.clone(),
            recovery: config.gateway.recovery.clone(),
            self_id: None,
        }
    }
}

/// What happened to an inbound message
#[derive(Debug)]
pub enum Handled {
    /// Dropped without effect (self-originated)
    Ignored,
    /// Replies sent, nothing left running
    Replied,
    /// A prediction is running in the background
    PredictionStarted(JoinHandle<()>),
}

impl Handled {
    /// Wait for any background prediction to finish
    pub async fn finished(self) {
        if let Handled::PredictionStarted(handle) = self {
            if let Err(e) = handle.await {
                error!(error = %e, "Prediction task panicked");
            }
        }
    }
}

/// Per-user bookkeeping guarded by the user's lock
#[derive(Debug, Default)]
struct UserSlot {
    /// Bumped on every state write; predictions compare it before finalizing
    generation: u64,
    /// Ticket of the running prediction, if any
    in_flight: Option<u64>,
}

type SlotGuard = OwnedMutexGuard<UserSlot>;

struct Inner {
    catalog: Arc<MenuCatalog>,
    store: Arc<dyn ConversationStore>,
    transport: Arc<dyn Transport>,
    gateway: Arc<dyn InferenceGateway>,
    breaker: CircuitBreaker,
    readiness: ReadinessGate,
    settings: DispatchSettings,
    slots: Mutex<HashMap<String, Arc<AsyncMutex<UserSlot>>>>,
}

/// Executes menu-flow decisions against the store, transport and gateway
#[derive(Clone)]
pub struct MessageDispatcher {
    inner: Arc<Inner>,
}

impl MessageDispatcher {
    pub fn new(
        catalog: Arc<MenuCatalog>,
        store: Arc<dyn ConversationStore>,
        transport: Arc<dyn Transport>,
        gateway: Arc<dyn InferenceGateway>,
        readiness: ReadinessGate,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog,
                store,
                transport,
                gateway,
                breaker: CircuitBreaker::new(settings.recovery.clone()),
                readiness,
                settings,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn catalog(&self) -> &MenuCatalog {
        &self.inner.catalog
    }

    pub fn readiness(&self) -> &ReadinessGate {
        &self.inner.readiness
    }

    /// Handle one inbound message
    ///
    /// Never fails: transport, gateway and store errors are logged and
    /// answered with the generic failure reply.
    pub async fn handle(&self, msg: InboundMessage) -> Handled {
        self.inner.readiness.wait_ready().await;

        let user_id = msg.sender_id.clone();
        let language = self.reply_language(&msg);
        let slot = self.slot(&user_id);
        let guard = Arc::clone(&slot).lock_owned().await;

        let state = match self.inner.store.get(&user_id).await {
            Ok(state) => state,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to read conversation state");
                self.recover(guard, &msg, language).await;
                return Handled::Replied;
            }
        };

        let decision = decide(
            &msg,
            &state,
            &self.inner.catalog,
            self.inner.settings.self_id.as_deref(),
        );

        if decision.is_ignored() {
            debug!(user_id = %user_id, "Ignoring self-originated message");
            drop(guard);
            drop(slot);
            self.release_slot(&user_id);
            return Handled::Ignored;
        }

        let mut guard = guard;
        if let Some(next) = decision.next {
            debug!(user_id = %user_id, from = ?state, to = ?next, "Conversation transition");
            if let Err(e) = self.commit(&mut guard, &user_id, next).await {
                error!(user_id = %user_id, error = %e, "Failed to write conversation state");
                self.recover(guard, &msg, language).await;
                return Handled::Replied;
            }
        }

        for action in decision.actions {
            match action {
                Action::Reply(reply) => self.send(&msg, &reply, language).await,
                Action::Predict {
                    subject_key,
                    selector_token,
                } => {
                    return self
                        .start_prediction(slot, guard, msg, subject_key, selector_token, language)
                        .await;
                }
            }
        }

        drop(guard);
        drop(slot);
        self.release_slot(&user_id);
        Handled::Replied
    }

    async fn start_prediction(
        &self,
        slot: Arc<AsyncMutex<UserSlot>>,
        mut guard: SlotGuard,
        msg: InboundMessage,
        subject_key: String,
        selector_token: String,
        language: &'static str,
    ) -> Handled {
        // A run started before the last state change can no longer answer,
        // so only a run for the current conversation makes the user wait
        if guard.in_flight == Some(guard.generation) {
            info!(user_id = %msg.sender_id, "Prediction already running, asking user to wait");
            self.send(&msg, &Reply::PredictionInProgress, language).await;
            return Handled::Replied;
        }

        let ticket = guard.generation;
        if let Some(stale) = guard.in_flight.replace(ticket) {
            debug!(user_id = %msg.sender_id, stale_ticket = stale, "Superseding stale prediction");
        }

        info!(user_id = %msg.sender_id, subject_key = %subject_key, "Image received, starting prediction");
        self.reply_inline(
            &msg,
            &Reply::Analyzing {
                subject_key: subject_key.clone(),
            },
            language,
        )
        .await;
        drop(guard);

        let this = self.clone();
        let snapshot = ConversationState::AwaitingImage {
            subject_key,
            selector_token,
        };
        let handle = tokio::spawn(async move {
            this.run_prediction(slot, msg, snapshot, ticket, language).await;
        });

        Handled::PredictionStarted(handle)
    }

    async fn run_prediction(
        &self,
        slot: Arc<AsyncMutex<UserSlot>>,
        msg: InboundMessage,
        snapshot: ConversationState,
        ticket: u64,
        language: &'static str,
    ) {
        let user_id = msg.sender_id.clone();
        let subject_key = match &snapshot {
            ConversationState::AwaitingImage { subject_key, .. } => subject_key.clone(),
            _ => return,
        };

        let outcome = self.predict(&msg, &subject_key).await;

        let mut guard = Arc::clone(&slot).lock_owned().await;
        if guard.in_flight == Some(ticket) {
            guard.in_flight = None;
        }

        let still_current = guard.generation == ticket
            && match self.inner.store.get(&user_id).await {
                Ok(state) => state == snapshot,
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Could not re-read state after prediction");
                    true
                }
            };

        if !still_current {
            info!(
                user_id = %user_id,
                subject_key = %subject_key,
                "Conversation moved on during prediction, discarding result"
            );
            drop(guard);
            drop(slot);
            self.release_slot(&user_id);
            return;
        }

        // Success or failure, the per-subject flow ends here
        if let Err(e) = self.commit(&mut guard, &user_id, ConversationState::Idle).await {
            error!(user_id = %user_id, error = %e, "Failed to clear conversation state");
        }

        match outcome {
            Ok(result) => {
                info!(
                    user_id = %user_id,
                    subject_key = %subject_key,
                    label = %result.label,
                    "Sending prediction"
                );
                self.send(&msg, &Reply::Prediction(result), language).await;
            }
            Err(e) => {
                error!(user_id = %user_id, subject_key = %subject_key, error = %e, "Prediction failed");
                self.reply_inline(&msg, &Reply::PredictionFailed, language).await;
            }
        }

        drop(guard);
        drop(slot);
        self.release_slot(&user_id);
    }

    /// Download, validate and classify the image
    async fn predict(&self, msg: &InboundMessage, subject_key: &str) -> Result<PredictionResult, PredictionError> {
        let bytes = self.inner.transport.download_media(msg).await?;
        validate_image_payload(&bytes, self.inner.settings.max_image_bytes)?;

        if self.inner.breaker.is_open() {
            warn!(subject_key = %subject_key, "Circuit breaker open, skipping gateway call");
            return Err(GatewayError::CircuitOpen.into());
        }

        let timeout = self.inner.settings.gateway_timeout;
        let call = async {
            // Paused while the transport is disconnected
            self.inner.readiness.wait_ready().await;
            self.inner.gateway.predict(&bytes, subject_key).await
        };

        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(timeout.as_secs())),
        };

        match result {
            Ok(prediction) => {
                self.inner.breaker.record_success();
                Ok(prediction)
            }
            Err(e) => {
                self.inner.breaker.record_failure();
                Err(e.into())
            }
        }
    }

    /// Write a state and bump the user's generation
    async fn commit(
        &self,
        guard: &mut SlotGuard,
        user_id: &str,
        next: ConversationState,
    ) -> Result<(), StoreError> {
        guard.generation += 1;
        match next {
            ConversationState::Idle => self.inner.store.clear(user_id).await,
            state => self.inner.store.set(user_id, state).await,
        }
    }

    /// Best-effort reset after a store failure
    async fn recover(&self, mut guard: SlotGuard, msg: &InboundMessage, language: &'static str) {
        if let Err(e) = self.commit(&mut guard, &msg.sender_id, ConversationState::Idle).await {
            error!(user_id = %msg.sender_id, error = %e, "Failed to reset conversation state");
        }
        self.reply_inline(msg, &Reply::PredictionFailed, language).await;
    }

    async fn send(&self, msg: &InboundMessage, reply: &Reply, language: &str) {
        let text = reply.render(&self.inner.catalog, language);
        if let Err(e) = self.inner.transport.send_text(&msg.sender_id, &text).await {
            error!(user_id = %msg.sender_id, error = %e, "Failed to send reply");
        }
    }

    async fn reply_inline(&self, msg: &InboundMessage, reply: &Reply, language: &str) {
        let text = reply.render(&self.inner.catalog, language);
        if let Err(e) = self.inner.transport.reply_inline(msg, &text).await {
            error!(user_id = %msg.sender_id, error = %e, "Failed to send inline reply");
        }
    }

    fn reply_language(&self, msg: &InboundMessage) -> &'static str {
        let code = msg
            .language_code
            .as_deref()
            .unwrap_or(self.inner.settings.default_language.as_str());
        language_for(msg.text_body.as_deref(), Some(code))
    }

    fn slot(&self, user_id: &str) -> Arc<AsyncMutex<UserSlot>> {
        let mut slots = self.inner.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(user_id.to_string()).or_default())
    }

    /// Drop the user's slot once nobody else holds it
    fn release_slot(&self, user_id: &str) {
        let mut slots = self.inner.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map's own reference left: no waiter, no running prediction
        if slots.get(user_id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(user_id);
        }
    }

    /// Number of users with live per-user bookkeeping
    pub fn tracked_users(&self) -> usize {
        self.inner.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
