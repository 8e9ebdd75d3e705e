//! In-memory workbook model
//!
//! Spreadsheets are loaded once into [`Workbook`] and the layout parsers only
//! ever see this model, never the file format. Excel-family files go through
//! `calamine`; CSV files become a single-sheet workbook.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::NaiveDateTime;
use csv::ReaderBuilder;

use super::error::ImportError;
use crate::core::normalize::excel_serial_to_date;

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    /// Empty cells and blank strings carry no value
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering, trimmed. Whole numbers print without a fraction.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(dt) => dt.format("%Y-%m-%d").to_string(),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
                Some(date) => date
                    .and_hms_opt(0, 0, 0)
                    .map(CellValue::Date)
                    .unwrap_or(CellValue::Empty),
                None => CellValue::Empty,
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

/// Zero-based cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style address ("H65", "aa3")
    pub fn parse(addr: &str) -> Option<Self> {
        let addr = addr.trim();
        let letters: String = addr.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        let digits = &addr[letters.len()..];
        if letters.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let mut col: u32 = 0;
        for c in letters.to_ascii_uppercase().chars() {
            col = col.checked_mul(26)?.checked_add(c as u32 - 'A' as u32 + 1)?;
        }
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }

        Some(Self::new(row - 1, col - 1))
    }

    /// The cell immediately to the right
    pub fn right(&self) -> Self {
        Self::new(self.row, self.col + 1)
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut col = self.col + 1;
        let mut letters = Vec::new();
        while col > 0 {
            let rem = (col - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            col = (col - 1) / 26;
        }
        let letters: String = letters.into_iter().rev().collect();
        write!(f, "{}{}", letters, self.row + 1)
    }
}

/// Inclusive merged range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl MergedRange {
    pub fn contains(&self, cell: CellRef) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.col >= self.start.col
            && cell.col <= self.end.col
    }
}

/// A worksheet: sparse cells plus merged ranges
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<CellRef, CellValue>,
    merges: Vec<MergedRange>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set a cell by A1 address (builder style, handy in tests)
    pub fn with(mut self, addr: &str, value: CellValue) -> Self {
        if let Some(cell) = CellRef::parse(addr) {
            self.set(cell, value);
        }
        self
    }

    /// Set a text cell by A1 address
    pub fn with_text(self, addr: &str, text: &str) -> Self {
        self.with(addr, CellValue::Text(text.to_string()))
    }

    pub fn with_merge(mut self, start: &str, end: &str) -> Self {
        if let (Some(start), Some(end)) = (CellRef::parse(start), CellRef::parse(end)) {
            self.merges.push(MergedRange { start, end });
        }
        self
    }

    pub fn set(&mut self, cell: CellRef, value: CellValue) {
        if value == CellValue::Empty {
            self.cells.remove(&cell);
        } else {
            self.cells.insert(cell, value);
        }
    }

    pub fn add_merge(&mut self, range: MergedRange) {
        self.merges.push(range);
    }

    pub fn cell(&self, cell: CellRef) -> Option<&CellValue> {
        self.cells.get(&cell)
    }

    /// Raw value at an A1 address
    pub fn value(&self, addr: &str) -> Option<&CellValue> {
        CellRef::parse(addr).and_then(|c| self.cell(c))
    }

    /// Value at an address, or `CellValue::Empty`
    pub fn value_or_empty(&self, addr: &str) -> CellValue {
        self.value(addr).cloned().unwrap_or(CellValue::Empty)
    }

    /// Trimmed text at an address, or the fallback when the cell is absent
    pub fn text_or(&self, addr: &str, fallback: &str) -> String {
        match self.value(addr) {
            Some(v) => v.as_text(),
            None => fallback.to_string(),
        }
    }

    /// Text of a cell, resolving merged ranges to their top-left cell
    pub fn merged_text(&self, cell: CellRef) -> String {
        if let Some(v) = self.cell(cell).filter(|v| !v.is_blank()) {
            return v.as_text();
        }
        self.merges
            .iter()
            .find(|m| m.contains(cell))
            .and_then(|m| self.cell(m.start))
            .map(|v| v.as_text())
            .unwrap_or_default()
    }

    /// `merged_text` by A1 address
    pub fn merged_text_at(&self, addr: &str) -> String {
        CellRef::parse(addr)
            .map(|c| self.merged_text(c))
            .unwrap_or_default()
    }

    /// Top-left and bottom-right of the used area
    pub fn bounds(&self) -> Option<(CellRef, CellRef)> {
        let mut keys = self.cells.keys();
        let first = *keys.next()?;
        let (mut min, mut max) = (first, first);
        for c in keys {
            min.row = min.row.min(c.row);
            min.col = min.col.min(c.col);
            max.row = max.row.max(c.row);
            max.col = max.col.max(c.col);
        }
        Some((min, max))
    }

    /// Non-empty cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (&CellRef, &CellValue)> {
        self.cells.iter()
    }

    /// Dense rows covering the used area
    pub fn rows(&self) -> Vec<Vec<CellValue>> {
        let Some((min, max)) = self.bounds() else {
            return Vec::new();
        };
        (min.row..=max.row)
            .map(|r| {
                (min.col..=max.col)
                    .map(|c| {
                        self.cell(CellRef::new(r, c))
                            .cloned()
                            .unwrap_or(CellValue::Empty)
                    })
                    .collect()
            })
            .collect()
    }
}

/// Field separators tried on the first line, in order of preference
const CSV_DELIMITERS: [u8; 3] = [b';', b'\t', b','];

/// Pick the separator that occurs most often outside quotes on the first
/// non-blank line. Comma when none occurs.
fn sniff_delimiter(contents: &str) -> u8 {
    let Some(line) = contents.lines().find(|l| !l.trim().is_empty()) else {
        return b',';
    };

    let mut counts = [0usize; CSV_DELIMITERS.len()];
    let mut quoted = false;
    for b in line.bytes() {
        if b == b'"' {
            quoted = !quoted;
        } else if !quoted {
            if let Some(i) = CSV_DELIMITERS.iter().position(|d| *d == b) {
                counts[i] += 1;
            }
        }
    }

    let mut best = (b',', 0);
    for (d, n) in CSV_DELIMITERS.iter().zip(counts) {
        if n > best.1 {
            best = (*d, n);
        }
    }
    best.0
}

/// An ordered collection of sheets
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Load a workbook from disk, dispatching on the file extension
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Self::open_csv(path),
            "xlsx" | "xlsm" | "xls" | "xla" | "xlsb" | "ods" => Self::open_excel(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    fn open_excel(path: &Path) -> Result<Self, ImportError> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| ImportError::ExcelParse(e.to_string()))?;

        let merges: Vec<(String, MergedRange)> = match &mut workbook {
            Sheets::Xlsx(xlsx) => match xlsx.load_merged_regions() {
                Ok(()) => xlsx
                    .merged_regions()
                    .iter()
                    .map(|(sheet, _, dims)| {
                        let range = MergedRange {
                            start: CellRef::new(dims.start.0, dims.start.1),
                            end: CellRef::new(dims.end.0, dims.end.1),
                        };
                        (sheet.clone(), range)
                    })
                    .collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "could not read merged regions");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| ImportError::ExcelParse(e.to_string()))?;

            let mut sheet = Sheet::new(name.clone());
            let (row0, col0) = range.start().unwrap_or((0, 0));
            for (r, c, data) in range.used_cells() {
                sheet.set(
                    CellRef::new(row0 + r as u32, col0 + c as u32),
                    CellValue::from(data),
                );
            }
            for (_, m) in merges.iter().filter(|(sheet_name, _)| *sheet_name == name) {
                sheet.add_merge(*m);
            }
            sheets.push(sheet);
        }

        if sheets.is_empty() {
            return Err(ImportError::ExcelParse("workbook has no sheets".to_string()));
        }

        tracing::debug!(path = %path.display(), sheets = sheets.len(), "loaded workbook");
        Ok(Self { sheets })
    }

    fn open_csv(path: &Path) -> Result<Self, ImportError> {
        let contents = fs::read_to_string(path).map_err(|e| ImportError::FileRead(e.to_string()))?;
        let contents = contents.trim_start_matches('\u{feff}');
        let delimiter = sniff_delimiter(contents);

        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(contents.as_bytes());

        let mut sheet = Sheet::new("Sheet1");
        for (r, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| ImportError::CsvParse(e.to_string()))?;
            for (c, field) in record.iter().enumerate() {
                if !field.trim().is_empty() {
                    sheet.set(
                        CellRef::new(r as u32, c as u32),
                        CellValue::Text(field.to_string()),
                    );
                }
            }
        }

        tracing::debug!(
            path = %path.display(),
            delimiter = %(delimiter as char).escape_default(),
            "loaded csv as single sheet"
        );
        Ok(Self { sheets: vec![sheet] })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn first(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    pub fn last(&self) -> Option<&Sheet> {
        self.sheets.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cell_ref_roundtrip() {
        let c = CellRef::parse("H65").unwrap();
        assert_eq!(c, CellRef::new(64, 7));
        assert_eq!(c.to_string(), "H65");

        let aa = CellRef::parse("aa3").unwrap();
        assert_eq!(aa, CellRef::new(2, 26));
        assert_eq!(aa.to_string(), "AA3");

        assert!(CellRef::parse("12").is_none());
        assert!(CellRef::parse("A0").is_none());
        assert!(CellRef::parse("A1B").is_none());
    }

    #[test]
    fn test_merged_text_resolves_top_left() {
        let sheet = Sheet::new("F")
            .with_text("G4", "RNC-77")
            .with_merge("G4", "I5");

        assert_eq!(sheet.merged_text_at("G4"), "RNC-77");
        assert_eq!(sheet.merged_text_at("H5"), "RNC-77");
        assert_eq!(sheet.merged_text_at("J5"), "");
    }

    #[test]
    fn test_text_or_fallback() {
        let sheet = Sheet::new("F").with("A1", CellValue::Number(12.0));
        assert_eq!(sheet.text_or("A1", "x"), "12");
        assert_eq!(sheet.text_or("B1", "x"), "x");
    }

    #[test]
    fn test_rows_are_dense() {
        let sheet = Sheet::new("T")
            .with_text("A1", "Número")
            .with_text("C1", "Setor")
            .with_text("A2", "1");
        let rows = sheet.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0][1], CellValue::Empty);
        assert_eq!(rows[1][0], CellValue::Text("1".into()));
    }

    #[test]
    fn test_open_csv_as_single_sheet() {
        let mut tmp = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(tmp, "Número,Descrição,Setor").unwrap();
        writeln!(tmp, "10,Risco na bobina,Extrusão").unwrap();

        let wb = Workbook::open(tmp.path()).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Sheet1"]);
        let sheet = wb.first().unwrap();
        assert_eq!(sheet.text_or("B2", ""), "Risco na bobina");
    }

    #[test]
    fn test_open_semicolon_csv() {
        let mut tmp = NamedTempFile::with_suffix(".csv").unwrap();
        write!(tmp, "\u{feff}Número;Descrição;Setor\nRNC-1;Furo;Extrusão\nRNC-2;\"Risco; leve\";Picote\n").unwrap();

        let wb = Workbook::open(tmp.path()).unwrap();
        let sheet = wb.first().unwrap();
        assert_eq!(sheet.text_or("A1", ""), "Número");
        assert_eq!(sheet.text_or("C2", ""), "Extrusão");
        assert_eq!(sheet.text_or("B3", ""), "Risco; leve");

        let records = crate::import::parse_file(tmp.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].number, "RNC-2");
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a;b;c\n1,5;2;3"), b';');
        assert_eq!(sniff_delimiter("\na\tb\tc"), b'\t');
        assert_eq!(sniff_delimiter("\"x;y\",b,c"), b',');
        assert_eq!(sniff_delimiter("single"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_cell_value_from_calamine_data() {
        assert_eq!(CellValue::from(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(CellValue::from(&Data::Int(7)).as_text(), "7");
        assert_eq!(CellValue::from(&Data::Error(calamine::CellErrorType::NA)), CellValue::Empty);
    }

    fn fixture(name: &str) -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    #[test]
    fn test_open_xlsx_form_reads_dates_and_merges() {
        let wb = Workbook::open(&fixture("rnc_form.xlsx")).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Formulário RNC", "CAUSA&EFEITO"]);

        let form = wb.first().unwrap();
        let open = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            form.value("H7"),
            Some(&CellValue::Date(open.and_hms_opt(0, 0, 0).unwrap()))
        );
        assert_eq!(form.merged_text_at("H5"), "RNC-2024-031");
        assert_eq!(form.merged_text_at("I5"), "RNC-2024-031");
        assert_eq!(form.merged_text_at("J6"), "");

        let ishikawa = wb.sheet("CAUSA&EFEITO").unwrap();
        assert_eq!(ishikawa.text_or("B25", ""), "Material fora de especificação");
    }

    #[test]
    fn test_open_xlsx_keeps_absolute_positions() {
        let wb = Workbook::open(&fixture("rnc_table.xlsx")).unwrap();
        let sheet = wb.first().unwrap();

        assert_eq!(sheet.bounds().map(|(min, _)| min.to_string()), Some("B3".to_string()));
        assert_eq!(sheet.text_or("B3", ""), "Número");
        assert_eq!(sheet.value("B5"), Some(&CellValue::Number(1042.0)));
        assert!(matches!(sheet.value("F4"), Some(CellValue::Date(_))));
        assert!(sheet.value("A1").is_none());
    }

    #[test]
    fn test_open_rejects_unknown_extension() {
        let tmp = NamedTempFile::with_suffix(".txt").unwrap();
        let err = Workbook::open(tmp.path()).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(ext) if ext == "txt"));
    }

    #[test]
    fn test_open_missing_file() {
        let err = Workbook::open(Path::new("/nonexistent/rnc.xlsx")).unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }
}
