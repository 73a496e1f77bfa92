//! Typed GitHub webhook event types.
//!
//! This module defines typed representations of the webhook events the duty
//! bot handles. Each variant corresponds to a GitHub webhook event kind with
//! the fields needed to render a notification.
//!
//! The `action` field stays a free string at this layer: decoding checks
//! presence and type only, and the notification policy decides which action
//! values matter.

use serde::{Deserialize, Serialize};

/// A decoded repository event.
///
/// This enum contains only the event kinds the bot cares about; deliveries of
/// other kinds never reach the decoders. The notification policy matches on
/// it exhaustively, so adding a new event kind is a compile-time-checked
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepoEvent {
    /// An issue was opened, closed, reopened, etc.
    Issue(IssueEvent),

    /// A comment was created, edited, or deleted on an issue.
    ///
    /// Note: in GitHub's API, PR conversation comments are also delivered as
    /// `issue_comment` events; the bot treats them the same way.
    IssueComment(IssueCommentEvent),
}

impl RepoEvent {
    /// Returns the action string carried by the event.
    pub fn action(&self) -> &str {
        match self {
            RepoEvent::Issue(e) => &e.action,
            RepoEvent::IssueComment(e) => &e.action,
        }
    }
}

/// An `issues` webhook event.
///
/// All fields are populated on every successfully decoded value; decoding is
/// all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueEvent {
    /// The action that triggered this event (e.g. "opened", "closed").
    pub action: String,

    /// The issue's web URL.
    pub url: String,

    /// The issue title.
    pub title: String,
}

/// An `issue_comment` webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    /// The action that triggered this event (e.g. "created").
    pub action: String,

    /// The comment author's login name.
    pub user: String,

    /// The title of the issue the comment is on.
    pub issue_title: String,

    /// The comment body text, verbatim.
    pub body: String,

    /// The comment's web URL.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_accessor_matches_variant_field() {
        let issue = RepoEvent::Issue(IssueEvent {
            action: "opened".to_string(),
            url: "http://x/1".to_string(),
            title: "Bug X".to_string(),
        });
        assert_eq!(issue.action(), "opened");

        let comment = RepoEvent::IssueComment(IssueCommentEvent {
            action: "created".to_string(),
            user: "bob".to_string(),
            issue_title: "Bug X".to_string(),
            body: "LGTM".to_string(),
            url: "http://x/1#c1".to_string(),
        });
        assert_eq!(comment.action(), "created");
    }

    #[test]
    fn repo_event_serde_roundtrip() {
        let event = RepoEvent::IssueComment(IssueCommentEvent {
            action: "created".to_string(),
            user: "bob".to_string(),
            issue_title: "Bug X".to_string(),
            body: "LGTM".to_string(),
            url: "http://x/1#c1".to_string(),
        });
        let json = serde_json::to_string(&event).unwrap();
        let parsed: RepoEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }
}
