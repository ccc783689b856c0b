use super::{load_document, offset_in, Context};
use anyhow::Result;
use notedown_core::Document;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    /// Note being edited
    pub file: PathBuf,

    /// Byte offset of the cursor
    #[arg(long, conflicts_with = "line")]
    pub offset: Option<usize>,

    /// Cursor line (1-based)
    #[arg(long)]
    pub line: Option<usize>,

    /// Cursor column (1-based, in characters)
    #[arg(long, requires = "line")]
    pub column: Option<usize>,
}

/// Execute `complete`: link completions for the cursor, one per line as
/// `label<TAB>kind<TAB>insert text`. Empty output means completion does not
/// apply here.
pub fn execute(ctx: &Context, args: &Args) -> Result<String> {
    let doc = load_document(&args.file)?;
    let cursor = offset_in(doc.text(), args.offset, args.line, args.column)?;
    let items = ctx.notebook.completions(&doc, &args.file, cursor)?;
    ctx.render(&items, |items| {
        items
            .iter()
            .map(|item| format!("{}\t{}\n", item.label, item.insert_text))
            .collect()
    })
}
