use super::super::AddArgs;
use super::open_store;
use crate::Result;
use crate::config::Config;
use crate::validate::CommentRequest;

pub(crate) fn handle(config: &Config, args: AddArgs) -> Result<()> {
    let new = CommentRequest {
        version: config.comments.schema_version.clone(),
        author: args.author,
        text: args.text,
        color: args.color,
        reply: args.reply,
    }
    .validate(&config.comments.schema_version)?;

    let mut store = open_store(config)?;
    let comment = store.add_comment(&new)?;

    let rendered = serde_json::to_string_pretty(&comment).map_err(|source| {
        crate::StoreError::Encode {
            field: "comment",
            source,
        }
    })?;
    println!("{rendered}");
    Ok(())
}
