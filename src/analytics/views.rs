//! Dashboard views
//!
//! Each view bundles the numbers one dashboard screen shows. Views take the
//! already-filtered records.

use chrono::NaiveDate;
use serde::Serialize;

use super::metrics::{
    deviation_table, ishikawa_distribution, monthly_evolution, sector_distribution,
    status_distribution, supplier_ranking, top_causes, type_distribution, CauseShare,
    classify_cause, Count, DeviationRow, Efficacy, IshikawaCategory, Kpis,
};
use crate::entities::rnc::{RncRecord, RncType};

const OVERVIEW_TOP_SECTORS: usize = 5;
const TOP_SUPPLIERS: usize = 10;
const TOP_CAUSES: usize = 6;
const TOP_OCCURRENCES: usize = 5;

/// Available dashboard views
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum View {
    /// Overall KPIs, monthly evolution, type and status distribution, top sectors
    General,
    /// Internal RNCs by sector
    Internal,
    /// Supplier RNCs: ranking and top causes
    Suppliers,
    /// Closed-on-time effectiveness
    Efficacy,
    /// Records opened per month
    Monthly,
    /// Ishikawa classification and deviation table
    Deviation,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            View::General => "general",
            View::Internal => "internal",
            View::Suppliers => "suppliers",
            View::Efficacy => "efficacy",
            View::Monthly => "monthly",
            View::Deviation => "deviation",
        };
        write!(f, "{}", name)
    }
}

/// Overview screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralView {
    pub kpis: Kpis,
    pub monthly: Vec<Count>,
    pub types: Vec<Count>,
    pub statuses: Vec<Count>,
    pub top_sectors: Vec<Count>,
}

impl GeneralView {
    pub fn build(records: &[&RncRecord], today: NaiveDate) -> Self {
        let mut top_sectors = sector_distribution(records);
        top_sectors.truncate(OVERVIEW_TOP_SECTORS);
        Self {
            kpis: Kpis::compute(records.iter().copied()),
            monthly: monthly_evolution(records),
            types: type_distribution(records),
            statuses: status_distribution(records, today),
            top_sectors,
        }
    }
}

/// Internal process screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternalView {
    pub kpis: Kpis,
    pub sectors: Vec<Count>,
}

impl InternalView {
    pub fn build(records: &[&RncRecord]) -> Self {
        let internal = of_type(records, RncType::Internal);
        Self {
            kpis: Kpis::compute(internal.iter().copied()),
            sectors: sector_distribution(&internal),
        }
    }
}

/// Supplier quality screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuppliersView {
    pub kpis: Kpis,
    pub suppliers: Vec<Count>,
    pub causes: Vec<CauseShare>,
}

impl SuppliersView {
    pub fn build(records: &[&RncRecord]) -> Self {
        let suppliers = of_type(records, RncType::Supplier);
        Self {
            kpis: Kpis::compute(suppliers.iter().copied()),
            suppliers: supplier_ranking(&suppliers, TOP_SUPPLIERS),
            causes: top_causes(&suppliers, TOP_CAUSES),
        }
    }
}

/// Monthly screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyView {
    pub months: Vec<Count>,
}

impl MonthlyView {
    pub fn build(records: &[&RncRecord]) -> Self {
        Self {
            months: monthly_evolution(records),
        }
    }
}

/// An entry of the "top occurrences" list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub number: String,
    pub category: IshikawaCategory,
    pub description: String,
}

/// Process deviation screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationView {
    pub kpis: Kpis,
    pub categories: Vec<Count>,
    /// First records in input order
    pub top_occurrences: Vec<Occurrence>,
    pub table: Vec<DeviationRow>,
}

impl DeviationView {
    pub fn build(records: &[&RncRecord], today: NaiveDate) -> Self {
        Self {
            kpis: Kpis::compute(records.iter().copied()),
            categories: ishikawa_distribution(records),
            top_occurrences: records
                .iter()
                .take(TOP_OCCURRENCES)
                .map(|r| Occurrence {
                    number: r.number.clone(),
                    category: classify_cause(&r.cause),
                    description: r.description.clone(),
                })
                .collect(),
            table: deviation_table(records, today),
        }
    }
}

/// Any built view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DashboardView {
    General(GeneralView),
    Internal(InternalView),
    Suppliers(SuppliersView),
    Efficacy(Efficacy),
    Monthly(MonthlyView),
    Deviation(DeviationView),
}

impl DashboardView {
    pub fn build(view: View, records: &[&RncRecord], today: NaiveDate) -> Self {
        match view {
            View::General => DashboardView::General(GeneralView::build(records, today)),
            View::Internal => DashboardView::Internal(InternalView::build(records)),
            View::Suppliers => DashboardView::Suppliers(SuppliersView::build(records)),
            View::Efficacy => DashboardView::Efficacy(Efficacy::compute(records)),
            View::Monthly => DashboardView::Monthly(MonthlyView::build(records)),
            View::Deviation => DashboardView::Deviation(DeviationView::build(records, today)),
        }
    }
}

fn of_type<'a>(records: &[&'a RncRecord], rnc_type: RncType) -> Vec<&'a RncRecord> {
    records
        .iter()
        .copied()
        .filter(|r| r.rnc_type == rnc_type)
        .collect()
}
