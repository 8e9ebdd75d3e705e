//! `sgq sync` command - Synchronize the local cache with the document store

use console::style;
use miette::Result;

use crate::cli::helpers::open_workspace;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct SyncArgs {
    /// Upload the local cache to the store instead of downloading
    #[arg(long)]
    pub push: bool,
}

pub fn run(args: SyncArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, config, mut repo) = open_workspace(global)?;
    if !repo.has_remote() {
        return Err(miette::miette!(
            help = "enable the store in .sgq/config.yaml or unset SGQ_STORE_ENABLED",
            "No document store available"
        ));
    }

    if args.push {
        let written = repo.push().map_err(|e| miette::miette!("{}", e))?;
        if !global.quiet {
            println!(
                "{} Pushed {} record(s) to {}",
                style("✓").green(),
                style(written).cyan(),
                style(&config.store.collection).yellow()
            );
        }
    } else {
        let pulled = repo.pull().map_err(|e| miette::miette!("{}", e))?;
        if !global.quiet {
            println!(
                "{} Pulled {} record(s) from {}",
                style("✓").green(),
                style(pulled).cyan(),
                style(&config.store.collection).yellow()
            );
        }
    }
    Ok(())
}
