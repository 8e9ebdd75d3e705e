//! `sgq filters` command - Values available for each filter

use console::style;
use miette::Result;

use crate::analytics::FilterOptions;
use crate::cli::helpers::{load_records, open_workspace, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct FiltersArgs {}

pub fn run(_args: FiltersArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, config, repo) = open_workspace(global)?;
    let records = load_records(&repo, global)?;
    let options = FilterOptions::collect(&records);

    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Table);
    if print_structured(&options, format)? {
        return Ok(());
    }

    print_group("Months (--month)", &options.months);
    print_group("Sectors (--sector)", &options.sectors);
    print_group("Types (--type)", &options.types);
    print_group("Responsibles (--responsible)", &options.responsibles);
    Ok(())
}

fn print_group(title: &str, values: &[String]) {
    println!("{}", style(title).bold());
    if values.is_empty() {
        println!("  {}", style("(none)").dim());
    }
    for value in values {
        println!("  {}", value);
    }
    println!();
}
