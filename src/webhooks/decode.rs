//! Webhook payload decoders.
//!
//! These map a generic [`Payload`] of a known event kind into a typed
//! [`RepoEvent`] variant. Decoding is all-or-nothing: if any required field
//! is missing or not a string, the decoder fails with the field's path and no
//! partially populated event is ever returned.
//!
//! Decoders have no side effects; dropping a delivery on failure (and logging
//! it) is the caller's job.

use thiserror::Error;

use super::events::{IssueCommentEvent, IssueEvent};
use super::payload::{FieldError, Payload};

/// Error type for decode failures.
///
/// Wraps the field-level error so the failing path survives to the log line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decode error: {0}")]
pub struct DecodeError(#[from] pub FieldError);

impl DecodeError {
    /// Returns the dotted path of the field that failed to decode.
    pub fn path(&self) -> &str {
        self.0.path()
    }
}

/// Decodes an `issues` event payload.
///
/// Required fields: `action`, `issue.html_url`, `issue.title`.
pub fn decode_issue_event(payload: &Payload) -> Result<IssueEvent, DecodeError> {
    let action = payload.string("action")?.to_string();
    let url = payload.string("issue.html_url")?.to_string();
    let title = payload.string("issue.title")?.to_string();

    Ok(IssueEvent { action, url, title })
}

/// Decodes an `issue_comment` event payload.
///
/// Required fields: `action`, `comment.user.login`, `issue.title`,
/// `comment.body`, `comment.html_url`.
pub fn decode_issue_comment_event(payload: &Payload) -> Result<IssueCommentEvent, DecodeError> {
    let action = payload.string("action")?.to_string();
    let user = payload.string("comment.user.login")?.to_string();
    let issue_title = payload.string("issue.title")?.to_string();
    let body = payload.string("comment.body")?.to_string();
    let url = payload.string("comment.html_url")?.to_string();

    Ok(IssueCommentEvent {
        action,
        user,
        issue_title,
        body,
        url,
    })
}
