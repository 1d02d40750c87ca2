use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plant_doctor::bot::{self, TelegramTransport};
use plant_doctor::catalog::MenuCatalog;
use plant_doctor::config::{BotConfig, LogFormat};
use plant_doctor::conversation::InMemoryConversationStore;
use plant_doctor::dispatcher::{DispatchSettings, MessageDispatcher};
use plant_doctor::gateway::HttpInferenceGateway;
use plant_doctor::localization::init_localization;
use plant_doctor::readiness::ReadinessGate;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;
    init_tracing(config.log_format);

    info!("Starting Plant Doctor Telegram Bot");

    init_localization().context("Failed to load message bundles")?;

    let bot = Bot::new(&config.telegram_token);
    let readiness = ReadinessGate::new();

    // Login handshake: nothing is dispatched before the token is accepted
    let me = bot::check_connection(&bot, &readiness)
        .await
        .context("Could not reach the Telegram Bot API")?;
    info!(username = ?me.username, "Telegram client is ready");

    bot::spawn_health_monitor(
        bot.clone(),
        readiness.clone(),
        Duration::from_secs(config.health_check_interval_secs),
    );

    let gateway = HttpInferenceGateway::new(&config.gateway)?;
    info!(endpoint = %gateway.endpoint(), "Inference gateway configured");

    // Conversation state lives in memory and is lost on restart
    let dispatcher = MessageDispatcher::new(
        Arc::new(MenuCatalog::default()),
        Arc::new(InMemoryConversationStore::new()),
        Arc::new(TelegramTransport::new(bot.clone())),
        Arc::new(gateway),
        readiness,
        DispatchSettings::from(&config),
    );

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry().branch(Update::filter_message().endpoint(bot::message_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
