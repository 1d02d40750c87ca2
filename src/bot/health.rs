//! Bot API connection checks feeding the readiness gate

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::Me;
use teloxide::{ApiError, RequestError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use crate::readiness::ReadinessGate;

/// Call `getMe` once and update the gate from the outcome
pub async fn check_connection(bot: &Bot, gate: &ReadinessGate) -> Result<Me, RequestError> {
    match bot.get_me().await {
        Ok(me) => {
            gate.mark_ready();
            Ok(me)
        }
        Err(RequestError::Api(ApiError::InvalidToken)) => {
            error!("Bot token rejected by Telegram");
            gate.mark_auth_failure("invalid bot token");
            Err(RequestError::Api(ApiError::InvalidToken))
        }
        Err(e) => {
            gate.mark_disconnected(&e.to_string());
            Err(e)
        }
    }
}

/// Periodically re-check the connection in the background
pub fn spawn_health_monitor(bot: Bot, gate: ReadinessGate, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; startup already checked
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match check_connection(&bot, &gate).await {
                Ok(_) => debug!("Bot API health check passed"),
                Err(e) => error!(error = %e, "Bot API health check failed"),
            }
        }
    })
}
