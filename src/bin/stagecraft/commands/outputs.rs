//! `stagecraft outputs` command

use anyhow::Result;

use crate::cli::StageArgs;
use crate::commands::load_document;
use stagecraft::util::GlobalContext;

pub fn execute(args: StageArgs, ctx: &GlobalContext) -> Result<()> {
    let (_, document) = load_document(&args, ctx)?;

    for output in document.permanent_stack.outputs() {
        println!(
            "{:<48} {} ({})",
            output.export_name().as_str(),
            output.logical_id(),
            output.description()
        );
    }

    Ok(())
}
