//! `sgq clear` command - Delete every RNC

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::open_workspace;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: ClearArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, _config, mut repo) = open_workspace(global)?;

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Delete all RNCs from the store and the local cache?")
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("{}", style("Cancelled.").dim());
            return Ok(());
        }
    }

    let deleted = repo.clear().map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!(
            "{} Cleared local cache and {} stored record(s)",
            style("✓").green(),
            style(deleted).cyan()
        );
    }
    Ok(())
}
