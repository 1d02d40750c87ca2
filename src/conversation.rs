//! Conversation state module for tracking where each user is in the menu flow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::errors::StoreError;

/// Represents the conversation state of one user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingChoice,
    AwaitingImage {
        subject_key: String,
        selector_token: String,
    },
}

/// Current-state-only storage keyed by user identifier
///
/// Only the dispatcher writes, and only once the next state is fully decided.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Current state, `Idle` when the user has no record
    async fn get(&self, user_id: &str) -> Result<ConversationState, StoreError>;

    async fn set(&self, user_id: &str, state: ConversationState) -> Result<(), StoreError>;

    async fn clear(&self, user_id: &str) -> Result<(), StoreError>;
}

/// Process-local store. State does not survive a restart.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    states: RwLock<HashMap<String, ConversationState>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a non-idle state
    pub async fn active_users(&self) -> usize {
        self.states.read().await.len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, user_id: &str) -> Result<ConversationState, StoreError> {
        Ok(self
            .states
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set(&self, user_id: &str, state: ConversationState) -> Result<(), StoreError> {
        let mut states = self.states.write().await;
        // Idle is represented by absence
        if state == ConversationState::Idle {
            states.remove(user_id);
        } else {
            states.insert(user_id.to_string(), state);
        }
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        self.states.write().await.remove(user_id);
        Ok(())
    }
}
