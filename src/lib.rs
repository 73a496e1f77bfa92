//! Issue Duty Bot - emails whoever is on duty today about new GitHub issue activity.
//!
//! This library provides the core types and logic for the duty bot: webhook
//! payload decoding, the notification policy, the weekly duty roster, and the
//! dispatch loop that fans resolved notifications out to the mail transport.

pub mod config;
pub mod dispatch;
pub mod duty;
pub mod mail;
pub mod notify;
pub mod server;
pub mod webhooks;
