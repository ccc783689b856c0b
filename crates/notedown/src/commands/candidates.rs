use super::Context;
use anyhow::Result;
use std::path::PathBuf;

#[derive(clap::Args)]
pub struct Args {
    /// Note the links would be placed in; its own titles are left out
    pub file: PathBuf,
}

/// Execute `candidates`: every title in the note's directory except its own,
/// sorted and deduplicated.
pub fn execute(ctx: &Context, args: &Args) -> Result<String> {
    let titles = ctx.notebook.link_picker(&args.file)?;
    ctx.render(&titles, |titles| titles.iter().map(|t| format!("{}\n", t)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_context;

    #[test]
    fn leaves_out_own_titles() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Here~Alias.md", "b~A.md", "c~a.md"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let output = execute(
            &test_context(false),
            &Args {
                file: dir.path().join("Here~Alias.md"),
            },
        )
        .unwrap();
        assert_eq!(output, "A\na\nb\nc\n");
    }
}
