//! Webhook decoding for the duty bot.
//!
//! A delivery arrives tagged with an event-kind string (the `X-GitHub-Event`
//! header) and a JSON body. This module turns that pair into a typed
//! [`RepoEvent`]:
//!
//! - [`payload`]: generic field extraction over the JSON body
//! - [`events`]: the typed event variants
//! - [`decode`]: per-kind decoders with all-or-nothing semantics
//! - [`signature`]: HMAC-SHA256 delivery verification

pub mod decode;
pub mod events;
pub mod payload;
pub mod signature;

pub use decode::{DecodeError, decode_issue_comment_event, decode_issue_event};
pub use events::{IssueCommentEvent, IssueEvent, RepoEvent};
pub use payload::{FieldError, Payload};
pub use signature::verify_signature;
