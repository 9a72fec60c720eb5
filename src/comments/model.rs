//! Comment records and the per-namespace config record.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use uuid::Uuid;

/// `YYYY-MM-DD HH:MM:SS`, always UTC.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// A comment accepted for writing. `id` and `date` do not exist yet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewComment {
    pub author: String,
    pub text: String,
    pub color: String,
    pub reply: String,
}

impl NewComment {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = reply.into();
        self
    }

    /// Stamp the comment with its id and write time.
    pub(crate) fn finalize(&self, id: CommentId, date: String) -> Comment {
        Comment {
            id: id.to_string(),
            author: self.author.clone(),
            text: self.text.clone(),
            color: self.color.clone(),
            date,
            reply: self.reply.clone(),
        }
    }
}

/// A committed comment. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub color: String,
    pub date: String,
    pub reply: String,
}

impl Comment {
    pub fn parsed_id(&self) -> Option<CommentId> {
        CommentId::parse(&self.id)
    }
}

/// Namespace config stored at `<root>/<version>/config.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentConfig {
    pub version: String,
    pub first_block: u64,
    pub last_block: u64,
}

impl CommentConfig {
    pub fn initial(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            first_block: 1,
            last_block: 1,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.first_block >= 1 && self.first_block <= self.last_block
    }
}

/// `{version}_{block}_{token}`: locates a comment's block without a lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommentId {
    pub version: String,
    pub block: u64,
    pub token: String,
}

impl CommentId {
    /// Fresh id for a comment written into `block`.
    pub fn generate(version: &str, block: u64) -> Self {
        Self {
            version: version.to_string(),
            block,
            token: Uuid::new_v4().to_string(),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.rsplitn(3, '_');
        let token = parts.next()?;
        let block = parts.next()?.parse::<u64>().ok()?;
        let version = parts.next()?;
        if version.is_empty() || token.is_empty() || block == 0 {
            return None;
        }
        Some(Self {
            version: version.to_string(),
            block,
            token: token.to_string(),
        })
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.version, self.block, self.token)
    }
}

pub(crate) fn now_utc_string() -> Result<String, time::error::Format> {
    OffsetDateTime::now_utc().format(DATE_FORMAT)
}
