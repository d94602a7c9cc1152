//! `stagecraft build` command

use std::fs;

use anyhow::{Context, Result};

use crate::cli::BuildArgs;
use crate::commands::load_document;
use stagecraft::util::GlobalContext;

pub fn execute(args: BuildArgs, ctx: &GlobalContext) -> Result<()> {
    let (manifest, document) = load_document(&args.stage, ctx)?;
    let config = ctx.config();

    // --compact overrides config
    let pretty = !args.compact && config.build.pretty();
    let json = document.to_json(pretty)?;
    let fingerprint = document.fingerprint()?;

    // Output: --out > config out-dir > stdout
    let out = args.out.or_else(|| {
        config
            .build
            .out_dir
            .map(|dir| manifest.manifest_dir.join(dir).join(format!("{}.json", document.stage)))
    });

    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory: {}", parent.display()))?;
            }
            fs::write(&path, format!("{}\n", json))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("    Finished `{}` -> {}", document.stage, path.display());
        }
        None => {
            println!("{}", json);
            eprintln!("    Finished `{}`", document.stage);
        }
    }
    eprintln!(" Fingerprint {}", fingerprint);

    Ok(())
}
