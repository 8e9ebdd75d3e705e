//! Spreadsheet import
//!
//! Two layouts are supported. The *form* layout is the printed quality form,
//! one RNC per workbook. The *table* layout is a plain export with a header row.
//! [`detect_layout`] decides which parser to run.

pub mod error;
pub mod form;
pub mod table;
pub mod workbook;

use std::path::Path;

pub use error::ImportError;
pub use workbook::{CellValue, Sheet, Workbook};

use crate::entities::rnc::RncRecord;

/// Sheet-name fragments that identify a form workbook with high confidence
const FORM_SHEET_KEYWORDS: [&str; 3] = ["formulário", "formulario", "folha de rnc"];

/// Header words that identify a table
const TABLE_HEADER_KEYWORDS: [&str; 6] = ["número", "numero", "descrição", "setor", "status", "data"];

/// Minimum header keyword hits to treat the first sheet as a table
const TABLE_MIN_MATCHES: usize = 2;

/// Spreadsheet layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Form,
    Table,
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Form => write!(f, "form"),
            Layout::Table => write!(f, "table"),
        }
    }
}

/// Decide the layout of a workbook
pub fn detect_layout(workbook: &Workbook) -> Layout {
    let has_form_sheet = workbook.sheet_names().iter().any(|name| {
        let lower = name.to_lowercase();
        FORM_SHEET_KEYWORDS.iter().any(|k| lower.contains(k))
    });
    if has_form_sheet {
        return Layout::Form;
    }

    let header = workbook
        .first()
        .and_then(|sheet| sheet.rows().into_iter().next())
        .map(|row| {
            row.iter()
                .map(CellValue::as_text)
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase()
        })
        .unwrap_or_default();

    let matches = TABLE_HEADER_KEYWORDS
        .iter()
        .filter(|k| header.contains(*k))
        .count();

    if matches >= TABLE_MIN_MATCHES {
        Layout::Table
    } else {
        Layout::Form
    }
}

/// Parse an in-memory workbook into records
pub fn parse_workbook(workbook: &Workbook) -> Vec<RncRecord> {
    let layout = detect_layout(workbook);
    tracing::debug!(%layout, "detected layout");
    match layout {
        Layout::Form => form::parse(workbook),
        Layout::Table => table::parse(workbook),
    }
}

/// Load and parse a spreadsheet file
pub fn parse_file(path: &Path) -> Result<Vec<RncRecord>, ImportError> {
    let workbook = Workbook::open(path)?;
    if workbook.sheets().is_empty() {
        return Err(ImportError::NoSheet);
    }
    let records = parse_workbook(&workbook);
    tracing::info!(file = %path.display(), records = records.len(), "parsed spreadsheet");
    Ok(records)
}
