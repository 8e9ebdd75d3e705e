//! `sgq list` command - List RNCs with filtering

use miette::Result;

use crate::cli::helpers::{load_records, open_workspace, print_structured, today};
use crate::cli::table::{TableFormatter, TableRow, RNC_COLUMNS};
use crate::cli::{FilterArgs, GlobalOpts, OutputFormat};

/// Sort order for list output
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortField {
    /// Storage order
    #[default]
    None,
    Number,
    /// Open date, most recent first
    Open,
    /// Days to close, longest first
    Days,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Sort order
    #[arg(long, value_enum, default_value = "none")]
    pub sort: SortField,

    /// Show at most N records
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Print only the number of matching records
    #[arg(long)]
    pub count: bool,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, config, repo) = open_workspace(global)?;
    let records = load_records(&repo, global)?;
    let today = today();

    let mut selected = args.filters.to_filter().apply(&records, today);
    match args.sort {
        SortField::None => {}
        SortField::Number => selected.sort_by(|a, b| a.number.cmp(&b.number)),
        SortField::Open => selected.sort_by(|a, b| b.open_date.cmp(&a.open_date)),
        SortField::Days => selected.sort_by(|a, b| b.days.cmp(&a.days)),
    }
    if let Some(limit) = args.limit {
        selected.truncate(limit);
    }

    if args.count {
        println!("{}", selected.len());
        return Ok(());
    }

    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Table);
    if print_structured(&selected, format)? {
        return Ok(());
    }

    let rows: Vec<TableRow> = selected
        .iter()
        .map(|r| TableRow::from_record(r, r.effective_status(today)))
        .collect();
    let mut formatter = TableFormatter::new(RNC_COLUMNS, "RNC");
    if global.quiet {
        formatter = formatter.without_summary();
    }
    formatter.output(&rows, format);
    Ok(())
}
