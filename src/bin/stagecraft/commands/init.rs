//! `stagecraft init` command

use anyhow::Result;

use crate::cli::InitArgs;
use stagecraft::ops::init_project;
use stagecraft::util::GlobalContext;

pub fn execute(args: InitArgs, ctx: &GlobalContext) -> Result<()> {
    let path = match args.path {
        Some(path) if path.is_absolute() => path,
        Some(path) => ctx.cwd().join(path),
        None => ctx.cwd().to_path_buf(),
    };

    if !path.exists() {
        std::fs::create_dir_all(&path)?;
    }

    init_project(&path, args.service.as_deref())?;
    eprintln!("     Created stagecraft project in `{}`", path.display());
    Ok(())
}
