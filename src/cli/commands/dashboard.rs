//! `sgq dashboard` command - Quality dashboard views

use console::style;
use miette::Result;

use crate::analytics::{
    Count, DashboardView, DeviationRow, Efficacy, Kpis, RncFilter, View,
};
use crate::cli::helpers::{escape_csv, load_records, open_workspace, print_structured, today};
use crate::cli::table::{key_value_table, Cell, ColumnDef, TableFormatter, TableRow};
use crate::cli::{FilterArgs, GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct DashboardArgs {
    /// View to show
    #[arg(value_enum, default_value = "general")]
    pub view: View,

    #[command(flatten)]
    pub filters: FilterArgs,
}

const DEVIATION_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("number", "NÚMERO", 16),
    ColumnDef::new("open", "ABERTURA", 10),
    ColumnDef::new("sector", "SETOR", 16),
    ColumnDef::new("category", "CATEGORIA", 12),
    ColumnDef::new("status", "STATUS", 9),
    ColumnDef::new("age", "IDADE", 5),
    ColumnDef::new("long_open", "!", 1),
    ColumnDef::new("description", "DESCRIÇÃO", 40),
];

/// A titled two-column block of a view
struct Section {
    title: &'static str,
    headers: [&'static str; 2],
    rows: Vec<(String, String)>,
}

impl Section {
    fn new(title: &'static str, headers: [&'static str; 2]) -> Self {
        Self {
            title,
            headers,
            rows: Vec::new(),
        }
    }

    fn row(mut self, key: impl ToString, value: impl ToString) -> Self {
        self.rows.push((key.to_string(), value.to_string()));
        self
    }

    fn counts(title: &'static str, label: &'static str, counts: &[Count]) -> Self {
        counts
            .iter()
            .fold(Section::new(title, [label, "RNCs"]), |s, c| s.row(&c.name, c.value))
    }
}

pub fn run(args: DashboardArgs, global: &GlobalOpts) -> Result<()> {
    let (_project, config, repo) = open_workspace(global)?;
    let records = load_records(&repo, global)?;
    let today = today();

    let filter = args.filters.to_filter();
    let selected = filter.apply(&records, today);
    let view = DashboardView::build(args.view, &selected, today);

    let format = global
        .format
        .resolve(config.default_format.as_deref(), OutputFormat::Table);
    if print_structured(&view, format)? {
        return Ok(());
    }

    let (sections, deviations) = sections(&view);
    match format {
        OutputFormat::Csv => print!("{}", render_csv(&sections)),
        _ => {
            if !global.quiet {
                print_title(args.view, &filter, selected.len(), records.len());
            }
            for section in &sections {
                println!("{}", style(section.title).bold());
                println!(
                    "{}",
                    key_value_table(section.headers, section.rows.clone(), format)
                );
                println!();
            }
            if let Some(rows) = deviations {
                println!("{}", style("Desvios").bold());
                let table_rows: Vec<TableRow> = rows.iter().map(deviation_row).collect();
                TableFormatter::new(DEVIATION_COLUMNS, "deviation")
                    .without_summary()
                    .output(&table_rows, format);
            }
        }
    }
    Ok(())
}

fn print_title(view: View, filter: &RncFilter, shown: usize, total: usize) {
    println!(
        "{} {}",
        style("Dashboard:").bold(),
        style(view).cyan()
    );
    if !filter.is_empty() {
        println!(
            "{}",
            style(format!("{} of {} record(s) match the filters", shown, total)).dim()
        );
    }
    println!("{}", style("─".repeat(50)).dim());
}

fn kpi_section(kpis: &Kpis) -> Section {
    Section::new("Indicadores", ["Indicador", "Valor"])
        .row("Total", kpis.total)
        .row("Abertas", kpis.open)
        .row("Fechadas", kpis.closed)
        .row("Eficiência", format!("{:.1}%", kpis.efficiency))
        .row("Média de dias p/ fechamento", format!("{:.1}", kpis.avg_close_days))
}

fn efficacy_section(efficacy: &Efficacy) -> Section {
    Section::new("Eficácia", ["Indicador", "Valor"])
        .row("Total", efficacy.total)
        .row("Fechadas", efficacy.closed)
        .row("Eficazes", efficacy.effective)
        .row("Não eficazes", efficacy.not_effective)
        .row("Taxa de eficácia", format!("{:.1}%", efficacy.rate))
}

fn sections(view: &DashboardView) -> (Vec<Section>, Option<&[DeviationRow]>) {
    match view {
        DashboardView::General(v) => (
            vec![
                kpi_section(&v.kpis),
                Section::counts("Evolução mensal", "Mês", &v.monthly),
                Section::counts("Por tipo", "Tipo", &v.types),
                Section::counts("Por status", "Status", &v.statuses),
                Section::counts("Principais setores", "Setor", &v.top_sectors),
            ],
            None,
        ),
        DashboardView::Internal(v) => (
            vec![
                kpi_section(&v.kpis),
                Section::counts("Por setor", "Setor", &v.sectors),
            ],
            None,
        ),
        DashboardView::Suppliers(v) => (
            vec![
                kpi_section(&v.kpis),
                Section::counts("Ranking de fornecedores", "Fornecedor", &v.suppliers),
                v.causes.iter().fold(
                    Section::new("Principais causas", ["Causa", "RNCs (%)"]),
                    |s, c| s.row(&c.label, format!("{} ({}%)", c.count, c.percentage)),
                ),
            ],
            None,
        ),
        DashboardView::Efficacy(e) => (vec![efficacy_section(e)], None),
        DashboardView::Monthly(v) => (
            vec![Section::counts("Evolução mensal", "Mês", &v.months)],
            None,
        ),
        DashboardView::Deviation(v) => (
            vec![
                kpi_section(&v.kpis),
                Section::counts("Categorias (Ishikawa)", "Categoria", &v.categories),
                v.top_occurrences.iter().fold(
                    Section::new("Principais ocorrências", ["RNC", "Categoria: descrição"]),
                    |s, o| s.row(&o.number, format!("{}: {}", o.category, o.description)),
                ),
            ],
            Some(v.table.as_slice()),
        ),
    }
}

fn deviation_row(row: &DeviationRow) -> TableRow {
    TableRow::new(row.number.clone())
        .cell("number", Cell::Number(row.number.clone()))
        .cell("open", Cell::Date(row.open_date))
        .cell("sector", Cell::Text(row.sector.clone()))
        .cell("category", Cell::Text(row.category.label().to_string()))
        .cell("status", Cell::Status(row.status))
        .cell("age", Cell::Int(Some(row.age_days)))
        .cell("long_open", Cell::Flag(row.long_open))
        .cell("description", Cell::Text(row.description.clone()))
}

/// `section,name,value` lines
fn render_csv(sections: &[Section]) -> String {
    let mut out = String::from("section,name,value\n");
    for section in sections {
        for (name, value) in &section.rows {
            out.push_str(&format!(
                "{},{},{}\n",
                escape_csv(section.title),
                escape_csv(name),
                escape_csv(value)
            ));
        }
    }
    out
}
