//! Incremental block serialization.
//!
//! A block file is a JSON array that stays valid after every write. The first
//! record is written as a complete one-element array; every later record is
//! written [`APPEND_OFFSET`] bytes before end-of-file so it replaces the
//! previous `\n]\n` terminator and brings its own:
//!
//! ```text
//! [\n  {\n    "id": ...\n  }\n]\n           first record, offset 0
//! ,\n  {\n    "id": ...\n  }\n]\n           later records, offset -3
//! ```
//!
//! The growing file is never read back or rewritten.

use serde::Serialize;

use super::error::StoreError;
use super::model::Comment;

/// Seek position, relative to end-of-file, for non-first records.
pub const APPEND_OFFSET: i64 = -3;

/// Whether the record opens its block or extends it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockPosition {
    First,
    Subsequent,
}

impl BlockPosition {
    /// A block with no bytes gets its opening record.
    pub fn for_block_size(size: u64) -> Self {
        if size == 0 {
            BlockPosition::First
        } else {
            BlockPosition::Subsequent
        }
    }
}

/// Bytes to write and where to write them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub bytes: Vec<u8>,
    pub offset: i64,
}

/// Render one record as an array fragment.
///
/// Every field is encoded on its own; any encoding failure fails the whole
/// record.
pub fn comment_fragment(
    comment: &Comment,
    position: BlockPosition,
) -> Result<Fragment, StoreError> {
    let fields = [
        field("id", &comment.id)?,
        field("author", &comment.author)?,
        field("text", &comment.text)?,
        field("color", &comment.color)?,
        field("date", &comment.date)?,
        field("reply", &comment.reply)?,
    ];

    let (lead, offset) = match position {
        BlockPosition::First => ('[', 0),
        BlockPosition::Subsequent => (',', APPEND_OFFSET),
    };

    let mut out = String::with_capacity(fields.iter().map(|f| f.len() + 6).sum::<usize>() + 16);
    out.push(lead);
    out.push_str("\n  {\n");
    for (i, f) in fields.iter().enumerate() {
        out.push_str("    ");
        out.push_str(f);
        if i + 1 < fields.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("  }\n]\n");

    Ok(Fragment {
        bytes: out.into_bytes(),
        offset,
    })
}

fn field<T: Serialize + ?Sized>(name: &'static str, value: &T) -> Result<String, StoreError> {
    let encoded =
        serde_json::to_string(value).map_err(|source| StoreError::Encode { field: name, source })?;
    Ok(format!("\"{name}\": {encoded}"))
}
