//! `sgq show` command - Show one RNC

use console::style;
use miette::Result;

use crate::cli::helpers::{format_date, load_records, open_workspace, print_structured, today};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::rnc::{RncRecord, RncStatus};

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// RNC number (case-insensitive)
    pub number: String,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, config, repo) = open_workspace(global)?;
    let records = load_records(&repo, global)?;

    let wanted = args.number.trim();
    let record = records
        .iter()
        .find(|r| r.number.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| miette::miette!("No RNC found with number '{}'", wanted))?;

    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Yaml);
    match format {
        OutputFormat::Id => println!("{}", record.number),
        OutputFormat::Table | OutputFormat::Md | OutputFormat::Csv => {
            print_details(record, record.effective_status(today()))
        }
        other => {
            print_structured(record, other)?;
        }
    }
    Ok(())
}

fn print_details(record: &RncRecord, status: RncStatus) {
    let status_styled = match status {
        RncStatus::Open => style(status.label()).yellow(),
        RncStatus::Closed => style(status.label()).green(),
        RncStatus::Late => style(status.label()).red().bold(),
    };

    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("RNC").bold(),
        style(&record.number).cyan()
    );
    println!("{}: {}", style("Tipo").bold(), record.rnc_type);
    println!("{}: {}", style("Status").bold(), status_styled);
    println!("{}: {}", style("Setor").bold(), record.sector);
    println!("{}: {}", style("Responsável").bold(), record.responsible);
    if !record.supplier.is_empty() {
        println!("{}: {}", style("Fornecedor").bold(), record.supplier);
    }
    if !record.product.is_empty() {
        println!("{}: {}", style("Produto").bold(), record.product);
    }
    if !record.batch.is_empty() {
        println!("{}: {}", style("Lote").bold(), record.batch);
    }
    println!("{}", style("─".repeat(60)).dim());

    println!("{}: {}", style("Abertura").bold(), format_date(record.open_date));
    println!("{}: {}", style("Prazo").bold(), format_date(record.deadline));
    println!("{}: {}", style("Fechamento").bold(), format_date(record.close_date));
    if let Some(days) = record.days {
        println!("{}: {}", style("Dias").bold(), days);
    }

    println!();
    println!("{}", style("Descrição:").bold());
    println!("{}", record.description);
    println!();
    println!("{}: {}", style("Causa").bold(), record.cause);
    if !record.action.is_empty() {
        println!("{}", style("Ação:").bold());
        println!("{}", record.action);
    }
    println!("{}", style("─".repeat(60)).dim());
}
