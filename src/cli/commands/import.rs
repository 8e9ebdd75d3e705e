//! `sgq import` command - Import RNC spreadsheets

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::open_workspace;
use crate::cli::GlobalOpts;
use crate::core::merge::clean_batch;
use crate::entities::rnc::RncRecord;
use crate::import::{parse_file, ImportError};
use crate::store::RemoteWrite;

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Spreadsheet files (.xlsx, .xlsm, .xls, .ods, .csv)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Parse and report without saving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Continue with the remaining files after a file fails (default: stop)
    #[arg(long)]
    pub skip_errors: bool,
}

/// Import statistics
#[derive(Default)]
struct ImportStats {
    files_read: usize,
    files_failed: usize,
    records_parsed: usize,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, _config, mut repo) = open_workspace(global)?;

    let mut stats = ImportStats::default();
    let mut parsed: Vec<RncRecord> = Vec::new();

    for file in &args.files {
        match parse_file(file) {
            Ok(records) => {
                stats.files_read += 1;
                stats.records_parsed += records.len();
                if !global.quiet {
                    println!(
                        "{} {} {} record(s)",
                        style("✓").green(),
                        style(file.display()).cyan(),
                        records.len()
                    );
                }
                parsed.extend(records);
            }
            Err(e) => {
                stats.files_failed += 1;
                if !args.skip_errors {
                    return Err(import_error(file, e));
                }
                eprintln!(
                    "{} {}: {}",
                    style("✗").red(),
                    style(file.display()).cyan(),
                    e
                );
            }
        }
    }

    if args.dry_run {
        let batch = clean_batch(parsed);
        print_header();
        print_file_stats(&stats);
        println!("  Valid records:    {}", style(batch.len()).green());
        println!(
            "  Dropped:          {}",
            style(stats.records_parsed - batch.len()).dim()
        );
        println!();
        println!(
            "{}",
            style("Dry run complete. Nothing was saved.").yellow()
        );
        return Ok(());
    }

    let outcome = repo
        .import(parsed)
        .map_err(|e| miette::miette!("{}", e))?;

    if global.quiet {
        return Ok(());
    }

    print_header();
    print_file_stats(&stats);
    println!("  Records inserted: {}", style(outcome.merge.inserted).green());
    if outcome.merge.updated > 0 {
        println!("  Records updated:  {}", style(outcome.merge.updated).yellow());
    }
    if outcome.dropped > 0 {
        println!("  Dropped:          {}", style(outcome.dropped).dim());
    }
    println!("  Total records:    {}", style(outcome.total).cyan());

    match &outcome.remote {
        RemoteWrite::Written(n) => {
            println!("  Store writes:     {}", style(n).cyan());
        }
        RemoteWrite::Pending(reason) => {
            println!();
            println!(
                "{} Saved to the local cache only: {}",
                style("!").yellow(),
                reason
            );
            println!("  Run {} once the store is reachable", style("sgq sync --push").yellow());
        }
        RemoteWrite::Disabled => {
            println!("  Store writes:     {}", style("disabled").dim());
        }
    }

    Ok(())
}

fn import_error(file: &std::path::Path, e: ImportError) -> miette::Report {
    miette::miette!(
        help = "use --skip-errors to continue with the remaining files",
        "{}: {}",
        file.display(),
        e
    )
}

fn print_header() {
    println!();
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
}

fn print_file_stats(stats: &ImportStats) {
    println!("  Files read:       {}", style(stats.files_read).cyan());
    if stats.files_failed > 0 {
        println!("  Files failed:     {}", style(stats.files_failed).red());
    }
    println!("  Records parsed:   {}", style(stats.records_parsed).cyan());
}
