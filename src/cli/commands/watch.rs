//! `sgq watch` command - Follow document store changes

use console::style;
use miette::Result;
use std::time::Duration;

use crate::analytics::Kpis;
use crate::cli::helpers::{open_workspace, poll_interval};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct WatchArgs {
    /// Stop after this many seconds (default: run until interrupted)
    #[arg(long)]
    pub timeout: Option<u64>,
}

pub fn run(args: WatchArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, config, repo) = open_workspace(global)?;
    let interval = poll_interval(&config);

    if !global.quiet {
        println!(
            "{} Watching {} every {} ms",
            style("→").cyan(),
            style(&config.store.collection).yellow(),
            interval.as_millis()
        );
    }

    let subscription = repo
        .watch(interval, |records| {
            let kpis = Kpis::compute(&records);
            println!(
                "{} {} record(s): {} open, {} closed",
                style(chrono::Local::now().format("%H:%M:%S")).dim(),
                style(kpis.total).cyan(),
                style(kpis.open).yellow(),
                style(kpis.closed).green()
            );
        })
        .map_err(|e| miette::miette!("{}", e))?;

    match args.timeout {
        Some(secs) => {
            std::thread::sleep(Duration::from_secs(secs));
            subscription.cancel();
        }
        None => loop {
            if !subscription.is_active() {
                break;
            }
            std::thread::sleep(interval);
        },
    }
    Ok(())
}
