//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::analytics::RncFilter;
use crate::cli::commands::{
    clear::ClearArgs, completions::CompletionsArgs, dashboard::DashboardArgs,
    filters::FiltersArgs, import::ImportArgs, init::InitArgs, list::ListArgs, new::NewArgs,
    show::ShowArgs, sync::SyncArgs, watch::WatchArgs,
};
use crate::entities::rnc::{RncStatus, RncType};

#[derive(Parser)]
#[command(name = "sgq")]
#[command(author, version, about = "SGQ non-conformance (RNC) toolkit")]
#[command(long_about = "Import RNC spreadsheets, keep them in a shared document store with a local cache, and report quality dashboards.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .sgq/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new SGQ project
    Init(InitArgs),

    /// Import RNC spreadsheets (.xlsx, .xls, .ods, .csv)
    Import(ImportArgs),

    /// List RNCs with filtering
    List(ListArgs),

    /// Show one RNC
    Show(ShowArgs),

    /// Register an RNC manually
    New(NewArgs),

    /// Show the values available for each filter
    Filters(FiltersArgs),

    /// Show a dashboard view
    Dashboard(DashboardArgs),

    /// Synchronize the local cache with the document store
    Sync(SyncArgs),

    /// Follow document store changes
    Watch(WatchArgs),

    /// Delete all RNCs from the store and the local cache
    Clear(ClearArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pick per command (table for lists, details for show)
    #[default]
    Auto,
    /// Human-readable table
    Table,
    /// JSON format (for programming)
    Json,
    /// YAML format
    Yaml,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just RNC numbers, one per line
    Id,
}

impl OutputFormat {
    /// Resolve `Auto` against a configured default and a command fallback
    pub fn resolve(self, configured: Option<&str>, fallback: OutputFormat) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        configured
            .and_then(|name| OutputFormat::from_str(name, true).ok())
            .filter(|f| *f != OutputFormat::Auto)
            .unwrap_or(fallback)
    }
}

/// Filters shared by `list` and `dashboard`
#[derive(clap::Args, Clone, Debug, Default)]
pub struct FilterArgs {
    /// Month of the open date (e.g. "Março")
    #[arg(long)]
    pub month: Option<String>,

    /// Sector (exact, e.g. "Extrusão")
    #[arg(long)]
    pub sector: Option<String>,

    /// RNC type (internal, supplier, complaint, return, or the Portuguese label)
    #[arg(long = "type", short = 't', value_parser = parse_type)]
    pub rnc_type: Option<RncType>,

    /// Responsible person (exact)
    #[arg(long)]
    pub responsible: Option<String>,

    /// Status (open, closed, late)
    #[arg(long, value_parser = parse_status)]
    pub status: Option<RncStatus>,

    /// Search in number and description
    #[arg(long)]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> RncFilter {
        RncFilter {
            month: self.month.clone(),
            sector: self.sector.clone(),
            rnc_type: self.rnc_type,
            responsible: self.responsible.clone(),
            status: self.status,
            search: self.search.clone(),
        }
    }
}

pub fn parse_type(s: &str) -> Result<RncType, String> {
    s.parse()
}

pub fn parse_status(s: &str) -> Result<RncStatus, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_filter_args_parse() {
        let cli = Cli::try_parse_from([
            "sgq", "list", "--type", "supplier", "--status", "Aberta", "--month", "Março",
        ])
        .unwrap();
        match cli.command {
            Commands::List(args) => {
                let filter = args.filters.to_filter();
                assert_eq!(filter.rnc_type, Some(RncType::Supplier));
                assert_eq!(filter.status, Some(RncStatus::Open));
                assert_eq!(filter.month.as_deref(), Some("Março"));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_output_format_resolution() {
        assert_eq!(
            OutputFormat::Auto.resolve(Some("json"), OutputFormat::Table),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::Auto.resolve(Some("bogus"), OutputFormat::Table),
            OutputFormat::Table
        );
        assert_eq!(
            OutputFormat::Csv.resolve(Some("json"), OutputFormat::Table),
            OutputFormat::Csv
        );
    }
}
