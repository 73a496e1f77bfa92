//! Generic webhook payload accessor.
//!
//! A webhook delivery arrives as arbitrary JSON. The decoders in this crate
//! only need typed field extraction at known dotted paths (e.g.
//! `comment.user.login`), so this module wraps [`serde_json::Value`] with
//! exactly that: `string(path)` and `object(path)` lookups that fail with the
//! full failing path rather than a bare "missing field".

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for field extraction failures.
///
/// Both variants carry the complete dotted path so that a dropped delivery
/// can be diagnosed from the log line alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The path does not exist in the payload.
    #[error("missing field: {0}")]
    Missing(String),

    /// The path exists but holds a value of the wrong JSON type.
    #[error("wrong type for field: {0}")]
    WrongType(String),
}

impl FieldError {
    /// Returns the dotted path of the failing field.
    pub fn path(&self) -> &str {
        match self {
            FieldError::Missing(p) | FieldError::WrongType(p) => p,
        }
    }
}

/// A single webhook delivery's JSON body, with typed field extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(serde_json::Value);

impl Payload {
    /// Wraps a parsed JSON body.
    pub fn new(body: serde_json::Value) -> Self {
        Payload(body)
    }

    /// Looks up a string at a dotted path (e.g. `"issue.html_url"`).
    pub fn string(&self, path: &str) -> Result<&str, FieldError> {
        let value = self.lookup(path)?;
        value.as_str().ok_or_else(|| FieldError::WrongType(path.to_string()))
    }

    /// Looks up a nested object at a dotted path and returns it as a scoped payload.
    pub fn object(&self, path: &str) -> Result<Payload, FieldError> {
        let value = self.lookup(path)?;
        if value.is_object() {
            Ok(Payload(value.clone()))
        } else {
            Err(FieldError::WrongType(path.to_string()))
        }
    }

    /// Walks the dotted path one segment at a time.
    ///
    /// A non-object encountered mid-path reports the prefix walked so far as
    /// wrong-typed; a missing key reports the prefix up to and including the
    /// absent segment.
    fn lookup(&self, path: &str) -> Result<&serde_json::Value, FieldError> {
        let mut current = &self.0;
        let mut walked = String::new();

        for segment in path.split('.') {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);

            let obj = current
                .as_object()
                .ok_or_else(|| FieldError::WrongType(walked.clone()))?;
            current = obj
                .get(segment)
                .ok_or_else(|| FieldError::Missing(walked.clone()))?;
        }

        Ok(current)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(body: serde_json::Value) -> Self {
        Payload(body)
    }
}
