//! # Plant Doctor Telegram Bot
//!
//! A Telegram bot that walks users through a small plant menu, forwards a
//! leaf photo to an external disease prediction service and relays the
//! predicted disease back to the chat.

pub mod bot;
pub mod catalog;
pub mod circuit_breaker;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod errors;
pub mod gateway;
pub mod localization;
pub mod media;
pub mod readiness;
pub mod transport;
