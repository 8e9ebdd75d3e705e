//! `sgq new` command - Register an RNC manually

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::open_workspace;
use crate::cli::GlobalOpts;
use crate::core::normalize::{
    normalize_sector, normalize_supplier, parse_date_text, APPROVED_SECTORS,
};
use crate::entities::rnc::{RncRecord, RncStatus, RncType, UNASSIGNED, UNSPECIFIED_CAUSE};
use crate::store::RemoteWrite;

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// RNC number (required unless interactive)
    #[arg(long, short = 'n')]
    pub number: Option<String>,

    /// Description of the non-conformance
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// RNC type (internal, supplier, complaint, return)
    #[arg(long = "type", short = 't', default_value = "internal", value_parser = crate::cli::args::parse_type)]
    pub rnc_type: RncType,

    /// Sector
    #[arg(long, short = 's')]
    pub sector: Option<String>,

    /// Responsible person
    #[arg(long, short = 'r')]
    pub responsible: Option<String>,

    /// Open date (dd/mm/yyyy or yyyy-mm-dd, default: today)
    #[arg(long)]
    pub open: Option<String>,

    /// Deadline for the treatment
    #[arg(long)]
    pub deadline: Option<String>,

    /// Close date; marks the RNC as closed
    #[arg(long)]
    pub close: Option<String>,

    /// Root cause
    #[arg(long)]
    pub cause: Option<String>,

    /// Corrective action
    #[arg(long)]
    pub action: Option<String>,

    /// Supplier name (supplier RNCs)
    #[arg(long)]
    pub supplier: Option<String>,

    #[arg(long)]
    pub product: Option<String>,

    #[arg(long)]
    pub batch: Option<String>,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

pub fn run(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let args = if args.interactive || args.number.is_none() {
        prompt(args)?
    } else {
        args
    };

    let record = build_record(&args, crate::cli::helpers::today())?;
    let number = record.number.clone();
    let status = record.status;

    let (_project, _config, mut repo) = open_workspace(global)?;
    let outcome = repo
        .import(vec![record])
        .map_err(|e| miette::miette!("{}", e))?;

    let verb = if outcome.merge.updated > 0 {
        "Updated"
    } else {
        "Created"
    };
    println!(
        "{} {} RNC {}",
        style("✓").green(),
        verb,
        style(&number).cyan()
    );
    println!(
        "   {} | {}",
        style(args.rnc_type).yellow(),
        style(status).white()
    );
    if let RemoteWrite::Pending(reason) = &outcome.remote {
        println!(
            "{} Saved to the local cache only: {}",
            style("!").yellow(),
            reason
        );
    }
    Ok(())
}

/// Fill missing fields from prompts
fn prompt(mut args: NewArgs) -> Result<NewArgs> {
    use dialoguer::{Input, Select};

    let number: String = Input::new()
        .with_prompt("RNC number")
        .with_initial_text(args.number.clone().unwrap_or_default())
        .interact_text()
        .into_diagnostic()?;
    args.number = Some(number);

    let description: String = Input::new()
        .with_prompt("Description")
        .with_initial_text(args.description.clone().unwrap_or_default())
        .interact_text()
        .into_diagnostic()?;
    args.description = Some(description);

    let type_labels: Vec<&str> = RncType::ALL.iter().map(|t| t.label()).collect();
    let type_idx = Select::new()
        .with_prompt("RNC type")
        .items(&type_labels)
        .default(RncType::ALL.iter().position(|t| *t == args.rnc_type).unwrap_or(0))
        .interact()
        .into_diagnostic()?;
    args.rnc_type = RncType::ALL[type_idx];

    let sector_idx = Select::new()
        .with_prompt("Sector")
        .items(&APPROVED_SECTORS)
        .default(0)
        .interact()
        .into_diagnostic()?;
    args.sector = Some(APPROVED_SECTORS[sector_idx].to_string());

    let responsible: String = Input::new()
        .with_prompt("Responsible")
        .default(UNASSIGNED.to_string())
        .interact_text()
        .into_diagnostic()?;
    args.responsible = Some(responsible);

    if args.rnc_type == RncType::Supplier {
        let supplier: String = Input::new()
            .with_prompt("Supplier")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        args.supplier = Some(supplier);
    }

    let deadline: String = Input::new()
        .with_prompt("Deadline (dd/mm/yyyy, empty for none)")
        .allow_empty(true)
        .interact_text()
        .into_diagnostic()?;
    if !deadline.trim().is_empty() {
        args.deadline = Some(deadline);
    }

    Ok(args)
}

fn parse_date_arg(flag: &str, value: Option<&str>) -> Result<Option<chrono::NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(text) => parse_date_text(text)
            .map(Some)
            .ok_or_else(|| miette::miette!("Invalid date for --{}: '{}'", flag, text)),
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|v| !v.is_empty())
}

/// Turn arguments into a canonical record
fn build_record(args: &NewArgs, today: chrono::NaiveDate) -> Result<RncRecord> {
    let number = non_empty(args.number.as_ref())
        .ok_or_else(|| miette::miette!("RNC number is required (use --number or -n)"))?;
    let description = non_empty(args.description.as_ref())
        .ok_or_else(|| miette::miette!("Description is required (use --description or -d)"))?;

    let mut record = RncRecord::new(number, description);
    if !record.is_numbered() {
        return Err(miette::miette!("'{}' is not a valid RNC number", record.number));
    }

    record.rnc_type = args.rnc_type;
    record.sector = normalize_sector(args.sector.as_deref().unwrap_or_default());
    record.responsible = non_empty(args.responsible.as_ref()).unwrap_or_else(|| UNASSIGNED.to_string());
    record.cause = non_empty(args.cause.as_ref()).unwrap_or_else(|| UNSPECIFIED_CAUSE.to_string());
    record.action = non_empty(args.action.as_ref()).unwrap_or_default();
    record.supplier = normalize_supplier(args.supplier.as_deref().unwrap_or_default(), args.rnc_type);
    record.product = non_empty(args.product.as_ref()).unwrap_or_default();
    record.batch = non_empty(args.batch.as_ref()).unwrap_or_default();

    record.open_date = parse_date_arg("open", args.open.as_deref())?.or(Some(today));
    record.deadline = parse_date_arg("deadline", args.deadline.as_deref())?;
    record.close_date = parse_date_arg("close", args.close.as_deref())?;

    if let (Some(open), Some(close)) = (record.open_date, record.close_date) {
        if close < open {
            return Err(miette::miette!("Close date is before the open date"));
        }
    }
    if record.close_date.is_some() {
        record.status = RncStatus::Closed;
    }
    record.recompute_days();
    Ok(record)
}
