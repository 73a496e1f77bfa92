//! Notification policy: which events notify, and how they read.
//!
//! The policy is a fixed table over the event's action string:
//!
//! | Event kind      | Notifying actions               |
//! |-----------------|---------------------------------|
//! | `issues`        | `opened`, `reopen`, `created`   |
//! | `issue_comment` | `created`                       |
//!
//! Any other action is dropped silently; that is the common case, not an
//! error. Rendering is pure and deterministic: the title carries the event
//! kind marker, subject, and action; the body carries the duty reminder, the
//! event details, and the source URL (with the comment author and verbatim
//! comment text for comment events).

use serde::{Deserialize, Serialize};

use crate::webhooks::events::{IssueCommentEvent, IssueEvent, RepoEvent};

/// Issue actions that produce a notification.
///
/// Note: "reopen", not "reopened". This table is policy, matched literally.
const ISSUE_NOTIFY_ACTIONS: [&str; 3] = ["opened", "reopen", "created"];

/// Comment actions that produce a notification.
const COMMENT_NOTIFY_ACTIONS: [&str; 1] = ["created"];

/// Reminder sentence opening every notification body.
const DUTY_REMINDER: &str = "Today is on your duty to handle github issues,";

/// A rendered title/body pair, not yet addressed to anyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Returns true if the event's action is in the notify table for its kind.
pub fn should_notify(event: &RepoEvent) -> bool {
    match event {
        RepoEvent::Issue(e) => ISSUE_NOTIFY_ACTIONS.contains(&e.action.as_str()),
        RepoEvent::IssueComment(e) => COMMENT_NOTIFY_ACTIONS.contains(&e.action.as_str()),
    }
}

/// Renders the notification for an event.
///
/// Pure: same event in, same title/body out. Callers are expected to check
/// [`should_notify`] first, but rendering any event is well-defined.
pub fn render(event: &RepoEvent) -> Notification {
    match event {
        RepoEvent::Issue(e) => render_issue(e),
        RepoEvent::IssueComment(e) => render_issue_comment(e),
    }
}

fn render_issue(event: &IssueEvent) -> Notification {
    Notification {
        title: format!("[GITHUB ISSUE] {} {}", event.title, event.action),
        body: format!(
            "{DUTY_REMINDER}\n{} is {}.\nURL: {}",
            event.title, event.action, event.url
        ),
    }
}

fn render_issue_comment(event: &IssueCommentEvent) -> Notification {
    Notification {
        title: format!(
            "[GITHUB ISSUE_COMMENTS] {} {} comments on {}",
            event.user, event.action, event.issue_title
        ),
        body: format!(
            "{DUTY_REMINDER}\n{} {} comment on {},\nURL: {}\n---\n{}",
            event.user, event.action, event.issue_title, event.url, event.body
        ),
    }
}
