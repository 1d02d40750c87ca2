//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Converts incoming Telegram messages and hands them to the dispatcher
//! - `transport`: Sends replies and downloads media through the Bot API
//! - `health`: Watches the Bot API connection and drives the readiness gate

pub mod health;
pub mod message_handler;
pub mod transport;

// Re-export main handler functions for use in main.rs
pub use health::{check_connection, spawn_health_monitor};
pub use message_handler::{inbound_from_message, message_handler};
pub use transport::{download_file, TelegramTransport};
