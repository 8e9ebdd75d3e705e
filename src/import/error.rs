//! Import error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: '{0}' (expected .xlsx, .xls, .ods or .csv)")]
    UnsupportedFormat(String),

    #[error("failed to read file: {0}")]
    FileRead(String),

    #[error("failed to parse spreadsheet: {0}")]
    ExcelParse(String),

    #[error("failed to parse CSV: {0}")]
    CsvParse(String),

    #[error("workbook has no usable sheet")]
    NoSheet,
}
