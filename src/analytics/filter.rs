//! Record filters and the options offered for them

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::{month_index, MONTH_NAMES};
use crate::entities::rnc::{RncRecord, RncStatus, RncType};

/// Active filters. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RncFilter {
    /// Portuguese month name ("Março"), matched against the open date
    pub month: Option<String>,
    pub sector: Option<String>,
    pub rnc_type: Option<RncType>,
    pub responsible: Option<String>,
    /// Matched against the effective status
    pub status: Option<RncStatus>,
    /// Case-insensitive substring of number or description
    pub search: Option<String>,
}

impl RncFilter {
    pub fn is_empty(&self) -> bool {
        *self == RncFilter::default()
    }

    /// Check whether a record passes every active filter
    pub fn matches(&self, record: &RncRecord, today: NaiveDate) -> bool {
        if let Some(month) = &self.month {
            let wanted = month_index(month);
            let actual = record.open_date.map(|d| d.month0() as usize);
            if wanted.is_none() || actual != wanted {
                return false;
            }
        }

        if let Some(sector) = &self.sector {
            if &record.sector != sector {
                return false;
            }
        }

        if let Some(rnc_type) = self.rnc_type {
            if record.rnc_type != rnc_type {
                return false;
            }
        }

        if let Some(responsible) = &self.responsible {
            if &record.responsible != responsible {
                return false;
            }
        }

        if let Some(status) = self.status {
            if record.effective_status(today) != status {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !record.number.to_lowercase().contains(&needle)
                && !record.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        true
    }

    /// Records passing the filter, in input order
    pub fn apply<'a>(&self, records: &'a [RncRecord], today: NaiveDate) -> Vec<&'a RncRecord> {
        records.iter().filter(|r| self.matches(r, today)).collect()
    }
}

/// Distinct values available for each filter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    /// Month names present in open dates, January first
    pub months: Vec<String>,
    pub sectors: Vec<String>,
    pub types: Vec<String>,
    pub responsibles: Vec<String>,
}

impl FilterOptions {
    pub fn collect(records: &[RncRecord]) -> Self {
        let mut months = BTreeSet::new();
        let mut sectors = BTreeSet::new();
        let mut types = BTreeSet::new();
        let mut responsibles = BTreeSet::new();

        for record in records {
            if let Some(open) = record.open_date {
                months.insert(open.month0() as usize);
            }
            if !record.sector.is_empty() {
                sectors.insert(record.sector.clone());
            }
            types.insert(record.rnc_type.label().to_string());
            if !record.responsible.is_empty() {
                responsibles.insert(record.responsible.clone());
            }
        }

        Self {
            months: months
                .into_iter()
                .map(|m| MONTH_NAMES[m].to_string())
                .collect(),
            sectors: sectors.into_iter().collect(),
            types: types.into_iter().collect(),
            responsibles: responsibles.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<RncRecord> {
        let mut a = RncRecord::new("RNC-1", "Furo na bobina");
        a.open_date = Some(date(2024, 3, 4));
        a.sector = "Extrusão".into();
        a.responsible = "Ana".into();

        let mut b = RncRecord::new("RNC-2", "Tinta manchada");
        b.open_date = Some(date(2024, 1, 20));
        b.sector = "Impressão".into();
        b.rnc_type = RncType::Supplier;
        b.responsible = "Bruno".into();
        b.deadline = Some(date(2024, 2, 1));

        let mut c = RncRecord::new("RNC-3", "Sem data");
        c.status = RncStatus::Closed;
        c.sector = "Extrusão".into();

        vec![a, b, c]
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let records = sample();
        let filter = RncFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&records, date(2024, 6, 1)).len(), 3);
    }

    #[test]
    fn test_month_filter_requires_open_date() {
        let records = sample();
        let filter = RncFilter {
            month: Some("Março".into()),
            ..Default::default()
        };
        let hits = filter.apply(&records, date(2024, 6, 1));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].number, "RNC-1");

        let unknown = RncFilter {
            month: Some("Smarch".into()),
            ..Default::default()
        };
        assert!(unknown.apply(&records, date(2024, 6, 1)).is_empty());
    }

    #[test]
    fn test_combined_filters() {
        let records = sample();
        let filter = RncFilter {
            sector: Some("Extrusão".into()),
            status: Some(RncStatus::Closed),
            ..Default::default()
        };
        let hits = filter.apply(&records, date(2024, 6, 1));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].number, "RNC-3");
    }

    #[test]
    fn test_status_filter_uses_effective_status() {
        let records = sample();
        let late = RncFilter {
            status: Some(RncStatus::Late),
            ..Default::default()
        };
        assert_eq!(late.apply(&records, date(2024, 6, 1))[0].number, "RNC-2");
        assert!(late.apply(&records, date(2024, 1, 25)).is_empty());
    }

    #[test]
    fn test_search_and_type() {
        let records = sample();
        let filter = RncFilter {
            search: Some("TINTA".into()),
            rnc_type: Some(RncType::Supplier),
            ..Default::default()
        };
        assert_eq!(filter.apply(&records, date(2024, 6, 1)).len(), 1);
    }

    #[test]
    fn test_filter_options() {
        let options = FilterOptions::collect(&sample());
        assert_eq!(options.months, vec!["Janeiro", "Março"]);
        assert_eq!(options.sectors, vec!["Extrusão", "Impressão"]);
        assert_eq!(options.types, vec!["Fornecedor", "Interna"]);
        assert_eq!(options.responsibles, vec!["Ana", "Bruno", "Não atribuído"]);
    }
}
