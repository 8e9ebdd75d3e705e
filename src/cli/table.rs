//! Table formatting for CLI list and dashboard output
//!
//! Record lists go through [`TableFormatter`], which renders aligned text,
//! CSV, Markdown or bare numbers. Dashboard series are small two-column
//! tables built with `tabled`.

use chrono::NaiveDate;
use console::{measure_text_width, pad_str, style, Alignment};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;
use crate::entities::rnc::{RncRecord, RncStatus};

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// RNC number (cyan)
    Number(String),
    /// Plain text, truncated to the column width
    Text(String),
    /// Status with color coding
    Status(RncStatus),
    Date(Option<NaiveDate>),
    Int(Option<i64>),
    /// Flag shown as a yellow marker when set
    Flag(bool),
}

impl Cell {
    /// Text for aligned output (with colors if terminal)
    pub fn format_table(&self, width: usize) -> String {
        let shown = match self {
            Cell::Number(n) => style(truncate_str(n, width)).cyan().to_string(),
            Cell::Text(s) => truncate_str(s, width),
            Cell::Status(status) => {
                let label = status.label();
                match status {
                    RncStatus::Open => style(label).yellow().to_string(),
                    RncStatus::Closed => style(label).green().to_string(),
                    RncStatus::Late => style(label).red().bold().to_string(),
                }
            }
            Cell::Flag(true) => style("!").yellow().bold().to_string(),
            Cell::Int(Some(n)) => {
                return pad_str(&n.to_string(), width, Alignment::Right, None).into_owned()
            }
            other => other.raw(),
        };
        pad_str(&shown, width, Alignment::Left, None).into_owned()
    }

    /// RFC 4180 CSV field, no colors
    pub fn format_csv(&self) -> String {
        escape_csv(&self.raw())
    }

    /// Markdown cell with escaped pipes
    pub fn format_md(&self) -> String {
        let raw = match self {
            Cell::Date(None) | Cell::Int(None) => "-".to_string(),
            Cell::Flag(true) => "**!**".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Unformatted value
    pub fn raw(&self) -> String {
        match self {
            Cell::Number(s) | Cell::Text(s) => s.clone(),
            Cell::Status(status) => status.label().to_string(),
            Cell::Date(d) => d.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default(),
            Cell::Int(n) => n.map(|n| n.to_string()).unwrap_or_default(),
            Cell::Flag(b) => if *b { "!".to_string() } else { String::new() },
        }
    }

    /// Display width of the unformatted value
    pub fn display_width(&self) -> usize {
        match self {
            Cell::Date(_) => 10,
            Cell::Flag(_) => 1,
            other => measure_text_width(&other.raw()),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub max_width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, max_width: usize) -> Self {
        Self {
            key,
            header,
            max_width,
        }
    }
}

/// Columns of an RNC list
pub const RNC_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("number", "NÚMERO", 16),
    ColumnDef::new("open", "ABERTURA", 10),
    ColumnDef::new("type", "TIPO", 22),
    ColumnDef::new("sector", "SETOR", 16),
    ColumnDef::new("status", "STATUS", 9),
    ColumnDef::new("responsible", "RESPONSÁVEL", 18),
    ColumnDef::new("days", "DIAS", 5),
    ColumnDef::new("description", "DESCRIÇÃO", 40),
];

/// A row of cells keyed by column
#[derive(Debug, Clone)]
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, Cell)>,
}

impl TableRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: Cell) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Standard row for an RNC list; `status` is the effective status
    pub fn from_record(record: &RncRecord, status: RncStatus) -> Self {
        TableRow::new(record.number.clone())
            .cell("number", Cell::Number(record.number.clone()))
            .cell("open", Cell::Date(record.open_date))
            .cell("type", Cell::Text(record.rnc_type.label().to_string()))
            .cell("sector", Cell::Text(record.sector.clone()))
            .cell("status", Cell::Status(status))
            .cell("responsible", Cell::Text(record.responsible.clone()))
            .cell("days", Cell::Int(record.days))
            .cell("description", Cell::Text(record.description.clone()))
    }
}

/// Outputs rows in the requested format
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            show_summary: true,
        }
    }

    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            OutputFormat::Id => rows.iter().map(|r| format!("{}\n", r.id)).collect(),
            _ => self.render_table(rows),
        }
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    fn widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(Cell::display_width)
                    .max()
                    .unwrap_or(0);
                content
                    .min(col.max_width)
                    .max(measure_text_width(col.header))
            })
            .collect()
    }

    fn render_table(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        if rows.is_empty() {
            if self.show_summary {
                out.push_str(&format!("No {}s found.\n", self.entity_name));
            }
            return out;
        }

        let widths = self.widths(rows);
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| pad_str(&style(col.header).bold().to_string(), *w, Alignment::Left, None).into_owned())
            .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');
        let total: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total));
        out.push('\n');

        for row in rows {
            let line: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| match row.get(col.key) {
                    Some(cell) => cell.format_table(*w),
                    None => " ".repeat(*w),
                })
                .collect();
            out.push_str(line.join(" ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s) found\n",
                style(rows.len()).cyan(),
                self.entity_name
            ));
        }
        out
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let keys: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        out.push_str(&keys.join(","));
        out.push('\n');
        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| row.get(col.key).map(Cell::format_csv).unwrap_or_default())
                .collect();
            out.push_str(&values.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.to_string()));
        for row in rows {
            builder.push_record(
                self.columns
                    .iter()
                    .map(|col| row.get(col.key).map(Cell::format_md).unwrap_or_default()),
            );
        }
        let mut table = builder.build();
        table.with(Style::markdown());
        format!("{}\n", table)
    }
}

/// Two-column table of labelled values
pub fn key_value_table<I, K, V>(headers: [&str; 2], rows: I, format: OutputFormat) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: ToString,
    V: ToString,
{
    let mut builder = Builder::default();
    builder.push_record(headers.map(str::to_string));
    for (k, v) in rows {
        builder.push_record([k.to_string(), v.to_string()]);
    }
    let mut table = builder.build();
    match format {
        OutputFormat::Md => table.with(Style::markdown()),
        _ => table.with(Style::rounded()),
    };
    table.to_string()
}
