//! `stagecraft imports` command

use anyhow::Result;

use crate::cli::StageArgs;
use crate::commands::load_document;
use stagecraft::core::MANIFEST_NAME;
use stagecraft::ops::audit_imports;
use stagecraft::util::diagnostic::{emit, Diagnostic};
use stagecraft::util::GlobalContext;

pub fn execute(args: StageArgs, ctx: &GlobalContext) -> Result<()> {
    let (manifest, document) = load_document(&args, ctx)?;
    let report = audit_imports(&document);

    for import in &report.imports {
        println!("{}", import);
    }

    let unresolved: Vec<_> = report.unresolved().collect();
    if !unresolved.is_empty() {
        let mut diagnostic = Diagnostic::warning(format!(
            "{} import(s) do not match a permanent stack export",
            unresolved.len()
        ))
        .with_location(manifest.manifest_dir.join(MANIFEST_NAME));
        for import in unresolved {
            diagnostic =
                diagnostic.with_context(format!("{} <- {}", import.export_name, import.location));
        }
        emit(&diagnostic, ctx.color());
    }

    Ok(())
}
