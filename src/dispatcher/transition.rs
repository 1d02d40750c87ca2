//! Pure state transition for the menu flow
//!
//! `decide` never touches the store or the transport: it maps an inbound
//! message and the sender's current state to the next state plus the actions
//! the executor should run.

use crate::catalog::{normalize_input, MenuCatalog};
use crate::conversation::ConversationState;
use crate::media::is_acceptable_image;
use crate::transport::InboundMessage;

use super::reply::Reply;

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send a reply to the sender
    Reply(Reply),
    /// Download the attached image and run a prediction for the subject
    Predict {
        subject_key: String,
        selector_token: String,
    },
}

/// Outcome of a transition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decision {
    /// New state; `None` leaves the current state untouched
    pub next: Option<ConversationState>,
    pub actions: Vec<Action>,
}

impl Decision {
    fn ignore() -> Self {
        Self::default()
    }

    fn reply(reply: Reply) -> Self {
        Self {
            next: None,
            actions: vec![Action::Reply(reply)],
        }
    }

    fn transition(next: ConversationState, reply: Reply) -> Self {
        Self {
            next: Some(next),
            actions: vec![Action::Reply(reply)],
        }
    }

    /// True when the message is dropped without any effect
    pub fn is_ignored(&self) -> bool {
        self.next.is_none() && self.actions.is_empty()
    }
}

/// Decide the next state and actions for one inbound message
///
/// Rules, first match wins:
/// 1. self-originated messages are ignored
/// 2. acceptable images: predict when awaiting one, otherwise say it was unexpected
/// 3. greeting/reset literals go back to the menu from any state
/// 4. while awaiting a choice, resolve the text against the catalog
/// 5. anything else while idle shows the menu
pub fn decide(
    msg: &InboundMessage,
    state: &ConversationState,
    catalog: &MenuCatalog,
    self_id: Option<&str>,
) -> Decision {
    let from_self = msg.is_self_originated || self_id.is_some_and(|id| id == msg.sender_id);
    if from_self {
        return Decision::ignore();
    }

    if msg.has_media && is_acceptable_image(msg) {
        return match state {
            ConversationState::AwaitingImage {
                subject_key,
                selector_token,
            } => Decision {
                next: None,
                actions: vec![Action::Predict {
                    subject_key: subject_key.clone(),
                    selector_token: selector_token.clone(),
                }],
            },
            _ => Decision::reply(Reply::UnexpectedImage),
        };
    }

    let text = normalize_input(msg.text_body.as_deref().unwrap_or_default());

    if catalog.is_reset_token(&text) {
        return Decision::transition(ConversationState::AwaitingChoice, Reply::Menu);
    }

    match state {
        ConversationState::AwaitingChoice => match catalog.resolve(&text) {
            Some(subject) => Decision::transition(
                ConversationState::AwaitingImage {
                    subject_key: subject.key.clone(),
                    selector_token: text,
                },
                Reply::SubjectSelected {
                    subject_key: subject.key.clone(),
                },
            ),
            None => Decision::reply(Reply::InvalidSelection),
        },
        ConversationState::AwaitingImage { subject_key, .. } => {
            Decision::reply(Reply::AwaitingImageReminder {
                subject_key: subject_key.clone(),
            })
        }
        ConversationState::Idle => {
            Decision::transition(ConversationState::AwaitingChoice, Reply::Menu)
        }
    }
}
