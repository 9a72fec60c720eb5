//! Request validation for new comments.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::comments::{CommentId, NewComment};

pub const MAX_AUTHOR_CHARS: usize = 50;
pub const MAX_TEXT_CHARS: usize = 5000;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Incorrect body data")]
    Body(#[source] serde_json::Error),

    #[error("Incorrect field: {0}")]
    Field(&'static str),
}

/// Body of a comment submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub version: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub author: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub color: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub reply: String,
}

/// `null` reads as an empty field, the same as a missing one.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl CommentRequest {
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        serde_json::from_slice(body).map_err(ValidationError::Body)
    }

    /// Check every field, in order, against `schema_version`.
    pub fn validate(self, schema_version: &str) -> Result<NewComment, ValidationError> {
        if self.version != schema_version {
            return Err(ValidationError::Field("version"));
        }
        if !within(&self.author, MAX_AUTHOR_CHARS) {
            return Err(ValidationError::Field("author"));
        }
        if !within(&self.text, MAX_TEXT_CHARS) {
            return Err(ValidationError::Field("text"));
        }
        if !is_color(&self.color) {
            return Err(ValidationError::Field("color"));
        }
        if !self.reply.is_empty() && CommentId::parse(&self.reply).is_none() {
            return Err(ValidationError::Field("reply"));
        }

        Ok(NewComment::new(self.author, self.text)
            .with_color(self.color)
            .with_reply(self.reply))
    }
}

/// Parse and validate in one step.
pub fn read_comment(body: &[u8], schema_version: &str) -> Result<NewComment, ValidationError> {
    CommentRequest::from_json(body)?.validate(schema_version)
}

fn within(value: &str, max_chars: usize) -> bool {
    let n = value.chars().count();
    (1..=max_chars).contains(&n)
}

/// Empty, or `#` followed by six hex digits.
fn is_color(color: &str) -> bool {
    if color.is_empty() {
        return true;
    }
    match color.strip_prefix('#') {
        Some(hex) => hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}
