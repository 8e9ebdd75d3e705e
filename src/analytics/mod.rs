//! Dashboard analytics
//!
//! Everything here is a pure function of a record slice (and `today` where
//! ages or late status matter), so the CLI can render the same numbers as
//! tables or JSON.

pub mod filter;
pub mod metrics;
pub mod views;

pub use filter::{FilterOptions, RncFilter};
pub use metrics::{
    classify_cause, Count, CauseShare, DeviationRow, Efficacy, IshikawaCategory, Kpis,
};
pub use views::{
    DashboardView, DeviationView, GeneralView, InternalView, MonthlyView, SuppliersView, View,
};

/// Full month names used by the month filter
pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Short month labels used by the monthly series
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Zero-based month index for a Portuguese month name, accents optional
pub fn month_index(name: &str) -> Option<usize> {
    let wanted = crate::core::normalize::fold(name);
    MONTH_NAMES
        .iter()
        .position(|m| crate::core::normalize::fold(m) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_index() {
        assert_eq!(month_index("Janeiro"), Some(0));
        assert_eq!(month_index("marco"), Some(2));
        assert_eq!(month_index(" DEZEMBRO "), Some(11));
        assert_eq!(month_index("Jan"), None);
    }
}
