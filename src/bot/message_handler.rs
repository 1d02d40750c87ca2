//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{Me, UserId};
use tracing::debug;

use crate::dispatcher::{Handled, MessageDispatcher};
use crate::transport::{InboundMessage, MediaKind};

/// Convert a Telegram message into the transport-neutral form
///
/// Photos become images (largest size), documents keep their mime type and
/// file name, any other attachment is `Other`. Captions count as text.
pub fn inbound_from_message(msg: &Message, self_id: UserId) -> InboundMessage {
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.clone());

    let is_self_originated = msg
        .from
        .as_ref()
        .map(|user| user.id == self_id)
        .unwrap_or(false);

    let text_body = msg
        .text()
        .or_else(|| msg.caption())
        .map(|s| s.to_string());

    let mut inbound = InboundMessage {
        sender_id: msg.chat.id.0.to_string(),
        text_body,
        is_self_originated,
        message_ref: Some(msg.id.0.to_string()),
        language_code,
        ..Default::default()
    };

    if let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) {
        inbound.has_media = true;
        inbound.media_kind = MediaKind::Image;
        inbound.media_ref = Some(largest_photo.file.id.0.clone());
    } else if let Some(doc) = msg.document() {
        inbound.has_media = true;
        inbound.media_kind = MediaKind::Document;
        inbound.mime_type = doc.mime_type.as_ref().map(|mime| mime.to_string());
        inbound.filename = doc.file_name.clone();
        inbound.media_ref = Some(doc.file.id.0.clone());
    } else if msg.sticker().is_some()
        || msg.video().is_some()
        || msg.animation().is_some()
        || msg.voice().is_some()
        || msg.audio().is_some()
        || msg.video_note().is_some()
    {
        inbound.has_media = true;
        inbound.media_kind = MediaKind::Other;
    }

    inbound
}

/// teloxide endpoint: forward every message to the dispatcher
///
/// Predictions keep running in the background after this returns, so the
/// chat's next update (e.g. a reset) is not blocked by the gateway.
pub async fn message_handler(msg: Message, me: Me, dispatcher: MessageDispatcher) -> Result<()> {
    let inbound = inbound_from_message(&msg, me.id);

    debug!(
        user_id = %inbound.sender_id,
        media_kind = ?inbound.media_kind,
        has_text = inbound.text_body.is_some(),
        "Received message from user"
    );

    match dispatcher.handle(inbound).await {
        Handled::PredictionStarted(_detached) => {
            debug!(user_id = msg.chat.id.0, "Prediction continues in background");
        }
        Handled::Ignored | Handled::Replied => {}
    }

    Ok(())
}
