//! KPIs and chart series

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::MONTH_ABBREVIATIONS;
use crate::core::normalize::{days_since, fold, UNDEFINED_SECTOR, UNIDENTIFIED_SUPPLIER};
use crate::entities::rnc::{RncRecord, RncStatus, RncType, UNSPECIFIED_CAUSE};

/// Supplier names this short are treated as unidentified
const MIN_SUPPLIER_NAME_LEN: usize = 3;

/// Open records older than this are flagged in the deviation table
pub const LONG_OPEN_DAYS: i64 = 60;

/// A labelled count, one bar or slice of a chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub name: String,
    pub value: usize,
}

impl Count {
    pub fn new(name: impl Into<String>, value: usize) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Tally labels keeping first-seen order, so ties stay in input order after
/// a stable sort
fn tally<'a, I>(labels: I) -> Vec<Count>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<Count> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    for label in labels {
        match index.get(label) {
            Some(&i) => counts[i].value += 1,
            None => {
                index.insert(label, counts.len());
                counts.push(Count::new(label, 1));
            }
        }
    }
    counts
}

fn sorted_desc(mut counts: Vec<Count>) -> Vec<Count> {
    counts.sort_by(|a, b| b.value.cmp(&a.value));
    counts
}

/// Headline indicators
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    /// Closed share of the total, in percent
    pub efficiency: f64,
    /// Mean `days` over closed records that have it
    pub avg_close_days: f64,
}

impl Kpis {
    pub fn compute<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a RncRecord>,
    {
        let mut total = 0;
        let mut closed = 0;
        let mut day_sum = 0i64;
        let mut day_count = 0usize;

        for record in records {
            total += 1;
            if record.is_closed() {
                closed += 1;
                if let Some(days) = record.days {
                    day_sum += days;
                    day_count += 1;
                }
            }
        }

        Self {
            total,
            open: total - closed,
            closed,
            efficiency: percent(closed, total),
            avg_close_days: if day_count > 0 {
                day_sum as f64 / day_count as f64
            } else {
                0.0
            },
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Records opened per calendar month (Jan..Dez), all years folded together
pub fn monthly_evolution(records: &[&RncRecord]) -> Vec<Count> {
    let mut buckets = [0usize; 12];
    for record in records {
        if let Some(open) = record.open_date {
            buckets[open.month0() as usize] += 1;
        }
    }
    MONTH_ABBREVIATIONS
        .iter()
        .zip(buckets)
        .map(|(name, value)| Count::new(*name, value))
        .collect()
}

/// Records per effective status, in first-seen order
pub fn status_distribution(records: &[&RncRecord], today: NaiveDate) -> Vec<Count> {
    let statuses: Vec<RncStatus> = records.iter().map(|r| r.effective_status(today)).collect();
    tally(statuses.iter().map(|s| s.label()))
}

/// Records per type over the four fixed categories; empty categories dropped
pub fn type_distribution(records: &[&RncRecord]) -> Vec<Count> {
    RncType::ALL
        .iter()
        .map(|t| Count::new(t.label(), records.iter().filter(|r| r.rnc_type == *t).count()))
        .filter(|c| c.value > 0)
        .collect()
}

/// Records per sector, most frequent first
pub fn sector_distribution(records: &[&RncRecord]) -> Vec<Count> {
    sorted_desc(tally(records.iter().map(|r| {
        if r.sector.trim().is_empty() {
            UNDEFINED_SECTOR
        } else {
            r.sector.as_str()
        }
    })))
}

/// Top suppliers by record count
pub fn supplier_ranking(records: &[&RncRecord], limit: usize) -> Vec<Count> {
    let mut ranking = sorted_desc(tally(records.iter().map(|r| {
        if r.supplier.chars().count() >= MIN_SUPPLIER_NAME_LEN {
            r.supplier.as_str()
        } else {
            UNIDENTIFIED_SUPPLIER
        }
    })));
    ranking.truncate(limit);
    ranking
}

/// A root cause and its share of the records considered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CauseShare {
    pub label: String,
    pub count: usize,
    /// Rounded percentage of the records considered
    pub percentage: u32,
}

/// Most frequent root causes
pub fn top_causes(records: &[&RncRecord], limit: usize) -> Vec<CauseShare> {
    let total = records.len().max(1);
    let mut causes = sorted_desc(tally(records.iter().map(|r| {
        if r.cause.trim().is_empty() {
            UNSPECIFIED_CAUSE
        } else {
            r.cause.as_str()
        }
    })));
    causes.truncate(limit);
    causes
        .into_iter()
        .map(|c| CauseShare {
            percentage: percent(c.value, total).round() as u32,
            label: c.name,
            count: c.value,
        })
        .collect()
}

/// Whether closed records met their deadline
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Efficacy {
    pub total: usize,
    pub closed: usize,
    pub effective: usize,
    pub not_effective: usize,
    /// Effective share of closed records, in percent
    pub rate: f64,
}

impl Efficacy {
    /// A closed record is effective when it closed on or before its deadline,
    /// or when there is no deadline (or close date) to compare
    pub fn compute(records: &[&RncRecord]) -> Self {
        let mut closed = 0;
        let mut effective = 0;

        for record in records.iter().filter(|r| r.is_closed()) {
            closed += 1;
            let on_time = match (record.close_date, record.deadline) {
                (Some(close), Some(deadline)) => close <= deadline,
                _ => true,
            };
            if on_time {
                effective += 1;
            }
        }

        Self {
            total: records.len(),
            closed,
            effective,
            not_effective: closed - effective,
            rate: percent(effective, closed),
        }
    }
}

/// Ishikawa (6M) cause categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IshikawaCategory {
    #[serde(rename = "Método")]
    Method,
    #[serde(rename = "Mão de Obra")]
    Manpower,
    #[serde(rename = "Máquina")]
    Machine,
    #[serde(rename = "Matéria-prima")]
    Material,
    #[serde(rename = "Medição")]
    Measurement,
    #[serde(rename = "Meio Ambiente")]
    Environment,
    #[serde(rename = "Outros")]
    Other,
}

impl IshikawaCategory {
    pub const ALL: [IshikawaCategory; 7] = [
        IshikawaCategory::Method,
        IshikawaCategory::Manpower,
        IshikawaCategory::Machine,
        IshikawaCategory::Material,
        IshikawaCategory::Measurement,
        IshikawaCategory::Environment,
        IshikawaCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            IshikawaCategory::Method => "Método",
            IshikawaCategory::Manpower => "Mão de Obra",
            IshikawaCategory::Machine => "Máquina",
            IshikawaCategory::Material => "Matéria-prima",
            IshikawaCategory::Measurement => "Medição",
            IshikawaCategory::Environment => "Meio Ambiente",
            IshikawaCategory::Other => "Outros",
        }
    }
}

impl std::fmt::Display for IshikawaCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// First 6M category whose name appears in the cause text
pub fn classify_cause(cause: &str) -> IshikawaCategory {
    let clean = fold(cause);
    IshikawaCategory::ALL
        .iter()
        .copied()
        .filter(|c| *c != IshikawaCategory::Other)
        .find(|c| clean.contains(&fold(c.label())))
        .unwrap_or(IshikawaCategory::Other)
}

/// Records per Ishikawa category, in category order, empty ones dropped
pub fn ishikawa_distribution(records: &[&RncRecord]) -> Vec<Count> {
    let categories: Vec<IshikawaCategory> = records.iter().map(|r| classify_cause(&r.cause)).collect();
    IshikawaCategory::ALL
        .iter()
        .map(|c| Count::new(c.label(), categories.iter().filter(|x| *x == c).count()))
        .filter(|c| c.value > 0)
        .collect()
}

/// Age of a record: stored days when closed, else days since opening, else 0
pub fn record_age(record: &RncRecord, today: NaiveDate) -> i64 {
    if record.is_closed() {
        if let Some(days) = record.days {
            return days;
        }
    }
    record
        .open_date
        .map(|open| days_since(open, today))
        .unwrap_or(0)
}

/// One line of the process deviation table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationRow {
    pub number: String,
    pub description: String,
    pub sector: String,
    pub category: IshikawaCategory,
    pub open_date: Option<NaiveDate>,
    pub status: RncStatus,
    pub age_days: i64,
    /// Still open after [`LONG_OPEN_DAYS`]
    pub long_open: bool,
}

/// Deviation table, most recently opened first (undated records last)
pub fn deviation_table(records: &[&RncRecord], today: NaiveDate) -> Vec<DeviationRow> {
    let mut sorted: Vec<&RncRecord> = records.to_vec();
    sorted.sort_by(|a, b| b.open_date.cmp(&a.open_date));

    sorted
        .into_iter()
        .map(|r| {
            let age_days = record_age(r, today);
            DeviationRow {
                number: r.number.clone(),
                description: r.description.clone(),
                sector: r.sector.clone(),
                category: classify_cause(&r.cause),
                open_date: r.open_date,
                status: r.effective_status(today),
                age_days,
                long_open: !r.is_closed() && age_days > LONG_OPEN_DAYS,
            }
        })
        .collect()
}
