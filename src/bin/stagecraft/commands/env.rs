//! `stagecraft env` command

use anyhow::Result;

use crate::cli::StageArgs;
use crate::commands::load_document;
use stagecraft::util::GlobalContext;

pub fn execute(args: StageArgs, ctx: &GlobalContext) -> Result<()> {
    let (_, document) = load_document(&args, ctx)?;

    for (name, value) in document.environment.iter() {
        println!("{} = {}", name, serde_json::to_string(value)?);
    }

    Ok(())
}
