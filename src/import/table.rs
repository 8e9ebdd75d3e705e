//! Table layout: header row plus one RNC per row

use std::collections::HashMap;

use crate::core::normalize::{
    fold, normalize_date, normalize_sector, normalize_supplier, normalize_type,
};
use crate::entities::rnc::{RncRecord, RncStatus, UNASSIGNED, UNNUMBERED, UNSPECIFIED_CAUSE};

use super::workbook::{CellValue, Workbook};

const NUMBER: &[&str] = &["Número", "Numero", "RNC"];
const DESCRIPTION: &[&str] = &["Descrição", "Descricao", "Defeito"];
const OPEN_DATE: &[&str] = &["Data", "Data Abertura", "Abertura"];
const CLOSE_DATE: &[&str] = &["Data Fechamento", "Fechamento", "Encerramento"];
const STATUS: &[&str] = &["Status"];
const SECTOR: &[&str] = &["Setor", "Área"];
const TYPE: &[&str] = &["Tipo", "Classificação"];
const SUPPLIER: &[&str] = &["Fornecedor"];
const RESPONSIBLE: &[&str] = &["Responsável", "Responsavel"];
const CAUSE: &[&str] = &["Causa", "Causa Raiz"];
const ACTION: &[&str] = &["Ação", "Acao", "Disposição"];
const DEADLINE: &[&str] = &["Prazo"];
const PRODUCT: &[&str] = &["Produto"];
const BATCH: &[&str] = &["Lote"];

/// Header name -> column index, keyed by folded header text
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_header(header: &[CellValue]) -> Self {
        let mut map = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            let key = fold(&cell.as_text());
            if !key.is_empty() {
                // Duplicate headers: the leftmost column wins
                map.entry(key).or_insert(idx);
            }
        }
        Self(map)
    }

    /// First alias whose cell in `row` is non-blank
    fn pick<'a>(&self, row: &'a [CellValue], aliases: &[&str]) -> Option<&'a CellValue> {
        aliases
            .iter()
            .filter_map(|alias| self.0.get(&fold(alias)))
            .filter_map(|&idx| row.get(idx))
            .find(|v| !v.is_blank())
    }

    fn text(&self, row: &[CellValue], aliases: &[&str]) -> String {
        self.pick(row, aliases).map(|v| v.as_text()).unwrap_or_default()
    }

    fn text_or(&self, row: &[CellValue], aliases: &[&str], fallback: &str) -> String {
        match self.text(row, aliases) {
            t if t.is_empty() => fallback.to_string(),
            t => t,
        }
    }
}

/// Parse the first sheet as a table
pub fn parse(workbook: &Workbook) -> Vec<RncRecord> {
    let Some(sheet) = workbook.first() else {
        return Vec::new();
    };

    let rows = sheet.rows();
    let Some((header, body)) = rows.split_first() else {
        return Vec::new();
    };
    let cols = Columns::from_header(header);

    let mut records = Vec::new();
    for (idx, row) in body.iter().enumerate() {
        let number = cols.text_or(row, NUMBER, UNNUMBERED);
        let description = cols.text(row, DESCRIPTION);

        if number == UNNUMBERED && description.is_empty() {
            tracing::trace!(row = idx + 2, "skipping row without number or description");
            continue;
        }

        let open_date = cols.pick(row, OPEN_DATE).and_then(normalize_date);
        let close_date = cols.pick(row, CLOSE_DATE).and_then(normalize_date);
        let status = if close_date.is_some() || cols.text(row, STATUS).to_lowercase().contains("fech")
        {
            RncStatus::Closed
        } else {
            RncStatus::Open
        };

        let rnc_type = normalize_type(&cols.text(row, TYPE));

        let mut record = RncRecord::new(number, description);
        record.sector = normalize_sector(&cols.text(row, SECTOR));
        record.rnc_type = rnc_type;
        record.status = status;
        record.open_date = open_date;
        record.close_date = close_date;
        record.deadline = cols.pick(row, DEADLINE).and_then(normalize_date);
        record.responsible = cols.text_or(row, RESPONSIBLE, UNASSIGNED);
        record.cause = cols.text_or(row, CAUSE, UNSPECIFIED_CAUSE);
        record.action = cols.text(row, ACTION);
        record.supplier = normalize_supplier(&cols.text(row, SUPPLIER), rnc_type);
        record.product = cols.text(row, PRODUCT);
        record.batch = cols.text(row, BATCH);
        record.recompute_days();

        records.push(record);
    }

    tracing::debug!(sheet = %sheet.name, rows = body.len(), records = records.len(), "parsed table layout");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::rnc::RncType;
    use crate::import::workbook::Sheet;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table(rows: &[&[&str]]) -> Workbook {
        let mut sheet = Sheet::new("Plan1");
        for (r, row) in rows.iter().enumerate() {
            for (c, text) in row.iter().enumerate() {
                if !text.is_empty() {
                    sheet.set(
                        crate::import::workbook::CellRef::new(r as u32, c as u32),
                        CellValue::Text(text.to_string()),
                    );
                }
            }
        }
        Workbook::new(vec![sheet])
    }

    #[test]
    fn test_parse_rows() {
        let wb = table(&[
            &["Número", "Descrição", "Data", "Data Fechamento", "Setor", "Tipo", "Fornecedor", "Responsável", "Prazo"],
            &["101", "Bobina amassada", "01/02/2024", "11/02/2024", "Logistica", "Interna", "", "Ana", "15/02/2024"],
            &["102", "Tinta fora do padrão", "03/02/2024", "", "Impressão", "Fornecedor", "N/A", "", ""],
        ]);

        let records = parse(&wb);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.number, "101");
        assert_eq!(first.sector, "Logística");
        assert_eq!(first.status, RncStatus::Closed);
        assert_eq!(first.days, Some(10));
        assert_eq!(first.deadline, Some(date(2024, 2, 15)));
        assert_eq!(first.responsible, "Ana");
        assert_eq!(first.supplier, "");

        let second = &records[1];
        assert_eq!(second.rnc_type, RncType::Supplier);
        assert_eq!(second.supplier, "Não Identificado");
        assert_eq!(second.status, RncStatus::Open);
        assert_eq!(second.responsible, UNASSIGNED);
        assert_eq!(second.cause, UNSPECIFIED_CAUSE);
        assert_eq!(second.days, None);
    }

    #[test]
    fn test_aliases_and_status_text() {
        let wb = table(&[
            &["RNC", "Defeito", "Abertura", "Status", "Área", "Classificação", "Causa Raiz", "Disposição", "Lote"],
            &["7", "Solda fraca", "2024-04-02", "Fechada", "corte", "Cliente - Devolução", "Temperatura", "Retrabalho", "L1"],
        ]);

        let r = &parse(&wb)[0];
        assert_eq!(r.number, "7");
        assert_eq!(r.description, "Solda fraca");
        assert_eq!(r.open_date, Some(date(2024, 4, 2)));
        assert_eq!(r.status, RncStatus::Closed);
        assert_eq!(r.days, None);
        assert_eq!(r.sector, "Corte e Solda");
        assert_eq!(r.rnc_type, RncType::CustomerReturn);
        assert_eq!(r.cause, "Temperatura");
        assert_eq!(r.action, "Retrabalho");
        assert_eq!(r.batch, "L1");
    }

    #[test]
    fn test_skips_rows_without_number_and_description() {
        let wb = table(&[
            &["Número", "Descrição", "Setor"],
            &["", "", "Extrusão"],
            &["", "Sem número", ""],
        ]);

        let records = parse(&wb);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number, UNNUMBERED);
        assert_eq!(records[0].sector, "Indefinido");
    }

    #[test]
    fn test_first_non_empty_alias_wins() {
        let wb = table(&[
            &["Numero", "RNC", "Descricao"],
            &["", "55", "x"],
        ]);
        assert_eq!(parse(&wb)[0].number, "55");
    }

    #[test]
    fn test_header_only() {
        let wb = table(&[&["Número", "Descrição"]]);
        assert!(parse(&wb).is_empty());
        assert!(parse(&Workbook::default()).is_empty());
    }
}
