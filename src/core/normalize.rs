//! Normalization rules for raw spreadsheet values
//!
//! Spreadsheets arrive with free-typed sectors, types and suppliers, and with
//! dates stored as real date cells, Excel serials, or Brazilian-formatted text.
//! Everything here maps those into the canonical values of [`RncRecord`].
//!
//! [`RncRecord`]: crate::entities::rnc::RncRecord

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use unicode_normalization::UnicodeNormalization;

use crate::entities::rnc::RncType;
use crate::import::workbook::CellValue;

/// Sectors recognized by the quality system
pub const APPROVED_SECTORS: [&str; 11] = [
    "Impressão",
    "Corte e Solda",
    "Picote",
    "Logística",
    "Extrusão",
    "Recuperadora",
    "Almoxarifado",
    "Compras",
    "Controle de Qualidade",
    "Clicheria",
    "Sacoleiras",
];

pub const UNDEFINED_SECTOR: &str = "Indefinido";

pub const UNIDENTIFIED_SUPPLIER: &str = "Não Identificado";

/// Supplier cell contents that mean "no supplier"
const SUPPLIER_PLACEHOLDERS: [&str; 6] = ["não se aplica", "nao se aplica", "n/a", "-", "x", "xxx"];

/// Day 0 of the Unix epoch expressed as an Excel serial
const EXCEL_UNIX_EPOCH: f64 = 25569.0;

/// Lowercase, trim and strip combining accents ("Extrusão" -> "extrusao")
pub fn fold(text: &str) -> String {
    text.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036f}')
}

/// Collapse runs of whitespace and lowercase (used for label matching)
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Map a raw sector onto the approved list
pub fn normalize_sector(raw: &str) -> String {
    let clean_raw = fold(raw);
    if clean_raw.is_empty() {
        return UNDEFINED_SECTOR.to_string();
    }

    APPROVED_SECTORS
        .iter()
        .find(|sector| {
            let clean_sector = fold(sector);
            clean_raw.contains(&clean_sector) || clean_sector.contains(&clean_raw)
        })
        .map(|s| s.to_string())
        .unwrap_or_else(|| UNDEFINED_SECTOR.to_string())
}

/// Classify the raw type cell. Anything unrecognized is internal.
pub fn normalize_type(raw: &str) -> RncType {
    let clean = fold(raw);
    if clean.contains("reclamacao") {
        RncType::CustomerComplaint
    } else if clean.contains("devolucao") {
        RncType::CustomerReturn
    } else if clean.contains("fornecedor") {
        RncType::Supplier
    } else {
        RncType::Internal
    }
}

/// Supplier names are kept only for supplier RNCs
pub fn normalize_supplier(raw: &str, rnc_type: RncType) -> String {
    if rnc_type != RncType::Supplier {
        return String::new();
    }

    let clean = raw.trim();
    if clean.is_empty() || SUPPLIER_PLACEHOLDERS.contains(&clean.to_lowercase().as_str()) {
        return UNIDENTIFIED_SUPPLIER.to_string();
    }

    clean.to_string()
}

/// Convert any cell into a calendar date
pub fn normalize_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Empty | CellValue::Bool(_) => None,
        CellValue::Date(dt) => Some(dt.date()),
        CellValue::Number(serial) => excel_serial_to_date(*serial),
        CellValue::Text(text) => parse_date_text(text),
    }
}

/// Excel serial (days since 1899-12-30) to date
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial == 0.0 {
        return None;
    }
    let millis = ((serial - EXCEL_UNIX_EPOCH) * 86_400_000.0).round() as i64;
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

/// Parse date text, day-first
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let clean = trimmed.replace(['-', '.'], "/");
    let parts: Vec<&str> = clean.split('/').collect();
    if parts.len() == 3 {
        if let (Some(d), Some(m), Some(y)) = (
            leading_int(parts[0]),
            leading_int(parts[1]),
            leading_int(parts[2]),
        ) {
            if (1..=31).contains(&d) && (1..=12).contains(&m) {
                let year = if (0..100).contains(&y) { 2000 + y } else { y };
                return NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, m as u32, d as u32);
            }
        }
    }

    parse_iso_like(&clean).or_else(|| parse_iso_like(trimmed))
}

fn parse_iso_like(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y/%m/%d %H:%M:%S", "%Y/%m/%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y/%m/%d", "%Y-%m-%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d);
        }
    }
    None
}

/// Integer prefix of a string, ignoring leading whitespace ("05 10:30" -> 5)
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Days elapsed from `from` until `to`, clamped at zero
pub fn days_since(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days().max(0)
}
