//! `stagecraft policy` command

use anyhow::Result;

use crate::cli::StageArgs;
use crate::commands::load_document;
use stagecraft::iam::{audit_policy, required_access};
use stagecraft::vars::static_set::bucket_variable;
use stagecraft::util::GlobalContext;
use stagecraft::Prefix;

pub fn execute(args: StageArgs, ctx: &GlobalContext) -> Result<()> {
    let (manifest, document) = load_document(&args, ctx)?;
    println!("{}", serde_json::to_string_pretty(&document.iam)?);

    let prefix = Prefix::new(&manifest.service.name, &document.stage)?;
    let bucket = document
        .environment
        .get(&bucket_variable(&manifest.content.bucket))
        .and_then(|v| v.as_text())
        .unwrap_or_default();
    let required = required_access(&prefix, manifest.entities(), bucket)?;
    let missing = audit_policy(&document.iam, &required);

    eprintln!(
        "     Covered {}/{} compute actions",
        required.len() - missing.len(),
        required.len()
    );
    for access in missing {
        eprintln!(
            "warning: `{}` is not granted on {}",
            access.action,
            serde_json::to_string(&access.resource)?
        );
    }

    Ok(())
}
