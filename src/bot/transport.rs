//! Telegram implementation of the outbound transport

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{FileId, MessageId, ReplyParameters};
use tracing::{debug, error};

use crate::errors::TransportError;
use crate::transport::{InboundMessage, Transport};

/// Download a file from Telegram into memory
pub async fn download_file(bot: &Bot, http: &reqwest::Client, file_id: FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let file_path = file.path;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file_path
    );

    let response = http.get(&url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;

    Ok(bytes.to_vec())
}

/// Bot API backed [`Transport`]
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    http: reqwest::Client,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            http: reqwest::Client::new(),
        }
    }
}

fn parse_chat_id(user_id: &str) -> Result<ChatId, TransportError> {
    user_id
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| TransportError::InvalidRecipient(user_id.to_string()))
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, user_id: &str, text: &str) -> Result<(), TransportError> {
        let chat_id = parse_chat_id(user_id)?;
        self.bot
            .send_message(chat_id, text)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(())
    }

    async fn download_media(&self, msg: &InboundMessage) -> Result<Vec<u8>, TransportError> {
        let file_id = msg
            .media_ref
            .as_deref()
            .ok_or_else(|| TransportError::MediaUnavailable("message has no file reference".to_string()))?;

        match download_file(&self.bot, &self.http, FileId(file_id.to_string())).await {
            Ok(bytes) => {
                debug!(user_id = %msg.sender_id, size = bytes.len(), "Image downloaded successfully");
                Ok(bytes)
            }
            Err(e) => {
                error!(user_id = %msg.sender_id, error = %e, "Failed to download image for user");
                Err(TransportError::MediaUnavailable(e.to_string()))
            }
        }
    }

    async fn reply_inline(&self, msg: &InboundMessage, text: &str) -> Result<(), TransportError> {
        let chat_id = parse_chat_id(&msg.sender_id)?;
        let reply_to = msg
            .message_ref
            .as_deref()
            .and_then(|id| id.parse::<i32>().ok())
            .map(MessageId);

        let request = self.bot.send_message(chat_id, text);
        let request = match reply_to {
            Some(message_id) => request.reply_parameters(ReplyParameters::new(message_id)),
            None => request,
        };

        request
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(())
    }
}
