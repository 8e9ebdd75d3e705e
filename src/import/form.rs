//! Form layout: one RNC per workbook, fields at fixed cells
//!
//! The quality form places each field at a known coordinate. The registration
//! number and the responsible person drift between form revisions, so those
//! two are located by their label first and fall back to fixed cells.

use chrono::NaiveDate;

use crate::core::normalize::{
    collapse_whitespace, normalize_date, normalize_sector, normalize_supplier, normalize_type,
    parse_date_text,
};
use crate::entities::rnc::{
    RncRecord, RncStatus, NO_DESCRIPTION, UNASSIGNED, UNNUMBERED, UNSPECIFIED_CAUSE,
};

use super::workbook::{Sheet, Workbook};

/// Sheet-name fragments identifying the form sheet
const FORM_SHEET_KEYWORDS: [&str; 5] = ["formulário", "formulario", "form", "rnc", "qualipapel"];

/// Sheet holding the cause-and-effect analysis
const ISHIKAWA_SHEET: &str = "CAUSA&EFEITO";

/// Label search is limited to the top-left corner of the form
const LABEL_SEARCH_MAX_ROW: u32 = 50;
const LABEL_SEARCH_MAX_COL: u32 = 30;

const NUMBER_LABEL: &str = "N° de Registro RNC -";
const NUMBER_FALLBACKS: [&str; 2] = ["H5", "G4"];

const RESPONSIBLE_LABEL: &str = "Responsável-N/C:";
const RESPONSIBLE_FALLBACKS: [&str; 2] = ["H9", "G8"];

const TYPE_CELL: &str = "J5";
const OPEN_DATE_CELL: &str = "H7";
const SECTOR_CELL: &str = "H8";
const SUPPLIER_CELL: &str = "D9";
const PRODUCT_CELL: &str = "C11";
const BATCH_CELL: &str = "C13";
const DESCRIPTION_CELL: &str = "D15";
const ACTION_CELL: &str = "D17";
const CAUSE_CELL: &str = "C26";
const ISHIKAWA_CAUSE_CELL: &str = "B25";

/// Cells holding "Data: dd/mm/yyyy" text in the closing block
const CLOSING_LABELED_CELLS: [&str; 2] = ["B78", "B77"];
/// Closing date cell used by the current form revision
const CLOSING_PRIMARY_CELL: &str = "I78";
/// Closing date cells used by older revisions
const CLOSING_FALLBACK_CELLS: [&str; 3] = ["H65", "I77", "I79"];

/// Pick the form sheet: first name matching a keyword, else the last sheet
pub fn find_form_sheet(workbook: &Workbook) -> Option<&Sheet> {
    workbook
        .sheets()
        .iter()
        .find(|s| {
            let name = s.name.to_lowercase();
            FORM_SHEET_KEYWORDS.iter().any(|k| name.contains(k))
        })
        .or_else(|| workbook.last())
}

/// Find a cell whose text equals `label` and return the value to its right
pub fn value_right_of_label(sheet: &Sheet, label: &str) -> String {
    let Some((min, max)) = sheet.bounds() else {
        return String::new();
    };
    let max_row = max.row.min(LABEL_SEARCH_MAX_ROW);
    let max_col = max.col.min(LABEL_SEARCH_MAX_COL);
    let wanted = collapse_whitespace(label);

    sheet
        .iter()
        .filter(|(c, _)| c.row >= min.row && c.row <= max_row && c.col >= min.col && c.col <= max_col)
        .find(|(_, v)| !v.is_blank() && collapse_whitespace(&v.as_text()) == wanted)
        .map(|(c, _)| sheet.merged_text(c.right()))
        .unwrap_or_default()
}

/// Label first, then the fallback cells in order
fn labeled_or_fallback(sheet: &Sheet, label: &str, fallbacks: &[&str]) -> String {
    let found = value_right_of_label(sheet, label);
    if !found.is_empty() {
        return found;
    }
    fallbacks
        .iter()
        .map(|addr| sheet.merged_text_at(addr))
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}

/// Locate the closing date across the cells used by the different form revisions
pub fn find_closing_date(sheet: &Sheet) -> Option<NaiveDate> {
    for addr in CLOSING_LABELED_CELLS {
        let text = sheet.text_or(addr, "");
        if text.to_lowercase().contains("data") {
            if let Some(date) = parse_date_text(strip_date_label(&text)) {
                return Some(date);
            }
        }
    }

    std::iter::once(CLOSING_PRIMARY_CELL)
        .chain(CLOSING_FALLBACK_CELLS)
        .find_map(|addr| normalize_date(&sheet.value_or_empty(addr)))
}

/// "Data: 05/03/2024" -> "05/03/2024"
fn strip_date_label(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.to_lowercase().find("data") {
        Some(idx) => trimmed
            .get(idx + 4..)
            .unwrap_or("")
            .trim_start_matches(':')
            .trim(),
        None => trimmed,
    }
}

/// Parse the form layout. Returns an empty list for an empty form.
pub fn parse(workbook: &Workbook) -> Vec<RncRecord> {
    let Some(sheet) = find_form_sheet(workbook) else {
        return Vec::new();
    };

    let mut number = labeled_or_fallback(sheet, NUMBER_LABEL, &NUMBER_FALLBACKS);
    if number.is_empty() {
        number = UNNUMBERED.to_string();
    }

    let mut responsible = labeled_or_fallback(sheet, RESPONSIBLE_LABEL, &RESPONSIBLE_FALLBACKS);
    if responsible.is_empty() {
        responsible = UNASSIGNED.to_string();
    }

    tracing::debug!(sheet = %sheet.name, %number, %responsible, "parsing form layout");

    let raw_type = sheet.text_or(TYPE_CELL, "Não informado");
    let raw_sector = sheet.text_or(SECTOR_CELL, "");
    let raw_supplier = sheet.text_or(SUPPLIER_CELL, "");

    let open_date = normalize_date(&sheet.value_or_empty(OPEN_DATE_CELL));
    let close_date = find_closing_date(sheet);
    let status = if close_date.is_some() {
        RncStatus::Closed
    } else {
        RncStatus::Open
    };

    let mut description = sheet.text_or(DESCRIPTION_CELL, "");
    if description.is_empty() {
        description = NO_DESCRIPTION.to_string();
    }

    if number == UNNUMBERED && description == NO_DESCRIPTION && open_date.is_none() {
        tracing::debug!(sheet = %sheet.name, "form is empty, skipping");
        return Vec::new();
    }

    let mut cause = sheet.text_or(CAUSE_CELL, "");
    if cause.is_empty() {
        if let Some(ishikawa) = workbook.sheet(ISHIKAWA_SHEET) {
            cause = ishikawa.text_or(ISHIKAWA_CAUSE_CELL, "");
        }
    }
    if cause.is_empty() {
        cause = UNSPECIFIED_CAUSE.to_string();
    }

    let rnc_type = normalize_type(&raw_type);

    let mut record = RncRecord::new(number, description);
    record.sector = normalize_sector(&raw_sector);
    record.rnc_type = rnc_type;
    record.status = status;
    record.open_date = open_date;
    record.close_date = close_date;
    record.responsible = responsible;
    record.cause = cause;
    record.action = sheet.text_or(ACTION_CELL, "");
    record.supplier = normalize_supplier(&raw_supplier, rnc_type);
    record.product = sheet.text_or(PRODUCT_CELL, "");
    record.batch = sheet.text_or(BATCH_CELL, "");
    record.recompute_days();

    vec![record]
}
