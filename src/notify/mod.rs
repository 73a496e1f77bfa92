//! Notification policy and job types.
//!
//! The policy decides which decoded events are notification-worthy and
//! renders the title/body pair for those that are. Resolving recipients and
//! transmitting the result belongs to the dispatch and mail layers.

pub mod policy;

pub use policy::{Notification, render, should_notify};

use serde::{Deserialize, Serialize};

use crate::duty::Recipient;

/// One resolved unit of outgoing work: a rendered notification addressed to a
/// single on-duty recipient.
///
/// Ephemeral: created by the dispatch loop, handed to the mailer, not
/// retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationJob {
    /// The email subject line.
    pub title: String,

    /// The email body text.
    pub body: String,

    /// The recipient this job is addressed to.
    pub recipient: Recipient,
}

impl NotificationJob {
    pub fn new(notification: &Notification, recipient: Recipient) -> Self {
        NotificationJob {
            title: notification.title.clone(),
            body: notification.body.clone(),
            recipient,
        }
    }
}
