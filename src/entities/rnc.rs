//! RNC entity type - Registro de Não Conformidade (non-conformance record)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder number used by forms that carry no registration number
pub const UNNUMBERED: &str = "S/N";

/// Default description for forms without one
pub const NO_DESCRIPTION: &str = "Sem descrição";

/// Default responsible when the form leaves it blank
pub const UNASSIGNED: &str = "Não atribuído";

/// Default cause when neither the form nor the Ishikawa sheet has one
pub const UNSPECIFIED_CAUSE: &str = "Não especificado";

/// RNC type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RncType {
    /// Internal process non-conformance
    #[serde(rename = "Interna")]
    Internal,
    /// Supplier quality issue
    #[serde(rename = "Fornecedor")]
    Supplier,
    /// Customer complaint
    #[serde(rename = "Cliente - Reclamação")]
    CustomerComplaint,
    /// Customer return
    #[serde(rename = "Cliente - Devolução")]
    CustomerReturn,
}

impl Default for RncType {
    fn default() -> Self {
        RncType::Internal
    }
}

impl RncType {
    /// All types, in dashboard order
    pub const ALL: [RncType; 4] = [
        RncType::Internal,
        RncType::Supplier,
        RncType::CustomerComplaint,
        RncType::CustomerReturn,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RncType::Internal => "Interna",
            RncType::Supplier => "Fornecedor",
            RncType::CustomerComplaint => "Cliente - Reclamação",
            RncType::CustomerReturn => "Cliente - Devolução",
        }
    }
}

impl std::fmt::Display for RncType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for RncType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "interna" | "internal" => Ok(RncType::Internal),
            "fornecedor" | "supplier" => Ok(RncType::Supplier),
            "cliente - reclamação" | "cliente - reclamacao" | "complaint" => {
                Ok(RncType::CustomerComplaint)
            }
            "cliente - devolução" | "cliente - devolucao" | "return" => Ok(RncType::CustomerReturn),
            _ => Err(format!(
                "Invalid RNC type: {}. Use internal, supplier, complaint, or return",
                s
            )),
        }
    }
}

/// RNC workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RncStatus {
    #[serde(rename = "Aberta")]
    Open,
    #[serde(rename = "Fechada")]
    Closed,
    /// Open past its deadline
    #[serde(rename = "Atrasada")]
    Late,
}

impl Default for RncStatus {
    fn default() -> Self {
        RncStatus::Open
    }
}

impl RncStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RncStatus::Open => "Aberta",
            RncStatus::Closed => "Fechada",
            RncStatus::Late => "Atrasada",
        }
    }
}

impl std::fmt::Display for RncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for RncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aberta" | "open" => Ok(RncStatus::Open),
            "fechada" | "fechado" | "closed" => Ok(RncStatus::Closed),
            "atrasada" | "late" => Ok(RncStatus::Late),
            _ => Err(format!(
                "Invalid RNC status: {}. Use open, closed, or late",
                s
            )),
        }
    }
}

/// A non-conformance record in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RncRecord {
    /// Document identifier, always the business number
    pub id: String,

    /// Business number (e.g., "RNC-2024-031")
    pub number: String,

    /// Free-text description of the non-conformance
    #[serde(default)]
    pub description: String,

    /// Normalized sector (approved list or "Indefinido")
    #[serde(default)]
    pub sector: String,

    #[serde(rename = "type", default)]
    pub rnc_type: RncType,

    #[serde(default)]
    pub status: RncStatus,

    #[serde(default)]
    pub open_date: Option<NaiveDate>,

    #[serde(default)]
    pub close_date: Option<NaiveDate>,

    #[serde(default)]
    pub deadline: Option<NaiveDate>,

    /// Person responsible for the treatment
    #[serde(default)]
    pub responsible: String,

    /// Root cause
    #[serde(default)]
    pub cause: String,

    /// Corrective action / disposition
    #[serde(default)]
    pub action: String,

    /// Normalized supplier name (supplier RNCs only)
    #[serde(default)]
    pub supplier: String,

    #[serde(default)]
    pub product: String,

    #[serde(default)]
    pub batch: String,

    /// Days between opening and closing
    #[serde(default)]
    pub days: Option<i64>,

    /// Set by the document store on first write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Set by the document store on every write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RncRecord {
    /// Create a record with the given number and description, everything else defaulted.
    /// The number is trimmed and doubles as the document id.
    pub fn new(number: impl Into<String>, description: impl Into<String>) -> Self {
        let number = number.into().trim().to_string();
        Self {
            id: number.clone(),
            number,
            description: description.into(),
            sector: crate::core::normalize::UNDEFINED_SECTOR.to_string(),
            rnc_type: RncType::default(),
            status: RncStatus::default(),
            open_date: None,
            close_date: None,
            deadline: None,
            responsible: UNASSIGNED.to_string(),
            cause: UNSPECIFIED_CAUSE.to_string(),
            action: String::new(),
            supplier: String::new(),
            product: String::new(),
            batch: String::new(),
            days: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether the record carries a usable business number
    pub fn is_numbered(&self) -> bool {
        let number = self.number.trim();
        !number.is_empty() && number != UNNUMBERED
    }

    pub fn is_closed(&self) -> bool {
        self.status == RncStatus::Closed
    }

    /// Recompute `days` from the dates. Only closed records with both dates get a value.
    pub fn recompute_days(&mut self) {
        self.days = match (self.status, self.open_date, self.close_date) {
            (RncStatus::Closed, Some(open), Some(close)) => Some(days_between(open, close)),
            _ => None,
        };
    }

    /// Status as of `today`: open records past their deadline are late
    pub fn effective_status(&self, today: NaiveDate) -> RncStatus {
        match (self.status, self.deadline) {
            (RncStatus::Open, Some(deadline)) if deadline < today => RncStatus::Late,
            (status, _) => status,
        }
    }

    /// Strip store-managed timestamps (the store owns them)
    pub fn without_timestamps(&self) -> Self {
        Self {
            created_at: None,
            updated_at: None,
            ..self.clone()
        }
    }
}

/// Whole days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}
