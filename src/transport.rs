//! Transport-neutral message types and the outbound transport seam.
//!
//! The Telegram implementation lives in [`crate::bot`]; tests use in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::TransportError;

/// Kind of media attached to an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Document,
    Other,
    #[default]
    None,
}

/// A message delivered by the transport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender_id: String,
    pub text_body: Option<String>,
    pub has_media: bool,
    pub media_kind: MediaKind,
    pub mime_type: Option<String>,
    pub filename: Option<String>,
    pub is_self_originated: bool,
    /// Transport handle of this message, for threaded replies
    pub message_ref: Option<String>,
    /// Transport handle of the attached file, for downloads
    pub media_ref: Option<String>,
    /// Client language code as reported by the transport (e.g. `bn-BD`)
    pub language_code: Option<String>,
}

impl InboundMessage {
    /// Plain text message
    pub fn text(sender_id: &str, body: &str) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            text_body: Some(body.to_string()),
            ..Default::default()
        }
    }

    /// Native image message
    pub fn image(sender_id: &str, media_ref: &str) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            has_media: true,
            media_kind: MediaKind::Image,
            media_ref: Some(media_ref.to_string()),
            ..Default::default()
        }
    }

    /// File attachment
    pub fn document(
        sender_id: &str,
        media_ref: &str,
        mime_type: Option<&str>,
        filename: Option<&str>,
    ) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            has_media: true,
            media_kind: MediaKind::Document,
            mime_type: mime_type.map(str::to_string),
            filename: filename.map(str::to_string),
            media_ref: Some(media_ref.to_string()),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language_code: &str) -> Self {
        self.language_code = Some(language_code.to_string());
        self
    }

    pub fn self_originated(mut self) -> Self {
        self.is_self_originated = true;
        self
    }
}

/// Outbound side of the chat transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a standalone message to a user
    async fn send_text(&self, user_id: &str, text: &str) -> Result<(), TransportError>;

    /// Fetch the media attached to a message
    async fn download_media(&self, msg: &InboundMessage) -> Result<Vec<u8>, TransportError>;

    /// Reply threaded to the originating message
    async fn reply_inline(&self, msg: &InboundMessage, text: &str) -> Result<(), TransportError>;
}
