//! Command implementations

pub mod build;
pub mod completions;
pub mod env;
pub mod imports;
pub mod init;
pub mod outputs;
pub mod policy;

use anyhow::Result;

use stagecraft::core::manifest::Manifest;
use stagecraft::util::GlobalContext;
use stagecraft::{Document, Stage};

use crate::cli::StageArgs;

/// Resolve the stage argument and the nearest manifest.
///
/// A missing stage fails before the manifest is read.
pub fn load(args: &StageArgs, ctx: &GlobalContext) -> Result<(Manifest, Stage)> {
    let stage = Stage::require(args.stage.as_deref())?;
    let manifest = Manifest::load(&ctx.find_manifest()?)?;
    Ok((manifest, stage))
}

/// Build the document for the stage argument.
pub fn load_document(args: &StageArgs, ctx: &GlobalContext) -> Result<(Manifest, Document)> {
    let (manifest, stage) = load(args, ctx)?;
    let document = stagecraft::build(&manifest, &stage)?;
    Ok((manifest, document))
}
