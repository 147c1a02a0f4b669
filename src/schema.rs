use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column carrying the account label in the wire format and in every table.
pub const ACCOUNT_COLUMN: &str = "Account_Name";
/// Metadata column: statement code. Never displayed.
pub const STATEMENT_COLUMN: &str = "Statement";
/// Metadata column: hierarchy level. Never displayed.
pub const LEVEL_COLUMN: &str = "Level";

/// Which financial statement a record belongs to.
///
/// Codes the model is told to emit map onto the named variants; anything else
/// is kept verbatim in `Unrecognized` so it still gets its own sub-table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatementCode {
    BalanceSheet,
    IncomeStatement,
    CostOfGoodsManufactured,
    CashFlow,
    EquityChange,
    RetainedEarnings,
    Other,
    Unrecognized(String),
}

impl StatementCode {
    pub const KNOWN: [StatementCode; 7] = [
        StatementCode::BalanceSheet,
        StatementCode::IncomeStatement,
        StatementCode::CostOfGoodsManufactured,
        StatementCode::CashFlow,
        StatementCode::EquityChange,
        StatementCode::RetainedEarnings,
        StatementCode::Other,
    ];

    /// Exact match on the wire code. Any other spelling, including a different
    /// case or surrounding whitespace, is its own statement.
    pub fn parse(raw: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|code| code.as_code() == raw)
            .cloned()
            .unwrap_or_else(|| StatementCode::Unrecognized(raw.to_string()))
    }

    /// The short code used on the wire (`BS`, `IS`, ...), or the raw code for
    /// unrecognized statements.
    pub fn as_code(&self) -> &str {
        match self {
            StatementCode::BalanceSheet => "BS",
            StatementCode::IncomeStatement => "IS",
            StatementCode::CostOfGoodsManufactured => "COGM",
            StatementCode::CashFlow => "CF",
            StatementCode::EquityChange => "SCE",
            StatementCode::RetainedEarnings => "RE",
            StatementCode::Other => "Other",
            StatementCode::Unrecognized(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, StatementCode::Unrecognized(_))
    }
}

impl From<String> for StatementCode {
    fn from(value: String) -> Self {
        StatementCode::parse(&value)
    }
}

impl From<&str> for StatementCode {
    fn from(value: &str) -> Self {
        StatementCode::parse(value)
    }
}

impl From<StatementCode> for String {
    fn from(value: StatementCode) -> Self {
        value.as_code().to_string()
    }
}

impl std::fmt::Display for StatementCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Visual tier of a report row. A flat annotation, not a tree edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum HierarchyLevel {
    /// Totals and major lines (e.g. total assets, revenue).
    Total,
    /// Subtotals (e.g. current assets, operating income).
    Subtotal,
    /// Line-item detail.
    Detail,
}

impl HierarchyLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            HierarchyLevel::Total => 1,
            HierarchyLevel::Subtotal => 2,
            HierarchyLevel::Detail => 3,
        }
    }
}

impl Default for HierarchyLevel {
    fn default() -> Self {
        Self::Detail
    }
}

impl From<u8> for HierarchyLevel {
    fn from(value: u8) -> Self {
        match value {
            1 => HierarchyLevel::Total,
            2 => HierarchyLevel::Subtotal,
            _ => HierarchyLevel::Detail,
        }
    }
}

impl From<HierarchyLevel> for u8 {
    fn from(value: HierarchyLevel) -> Self {
        value.as_u8()
    }
}

/// One row of the consolidated report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub statement_code: StatementCode,
    pub hierarchy_level: HierarchyLevel,
    pub account_name: String,
    /// Period label (free-text column header) to amount.
    pub period_values: BTreeMap<String, f64>,
}

impl Record {
    pub fn new(
        statement_code: impl Into<StatementCode>,
        hierarchy_level: HierarchyLevel,
        account_name: impl Into<String>,
    ) -> Self {
        Self {
            statement_code: statement_code.into(),
            hierarchy_level,
            account_name: account_name.into(),
            period_values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, period: impl Into<String>, value: f64) -> Self {
        self.period_values.insert(period.into(), value);
        self
    }

    /// Amount for a period; periods the record does not carry read as zero.
    pub fn value(&self, period: &str) -> f64 {
        self.period_values.get(period).copied().unwrap_or(0.0)
    }

    pub fn absolute_total(&self) -> f64 {
        self.period_values.values().map(|v| v.abs()).sum()
    }

    pub fn is_all_zero(&self) -> bool {
        self.absolute_total() == 0.0
    }
}

/// Shape of one element of the array the external source must return.
/// Used to describe the payload to the model, not to deserialize it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "ConsolidatedRow")]
pub struct RecordWireFormat {
    #[serde(rename = "Statement")]
    #[schemars(
        description = "Statement code: BS (Balance Sheet), IS (Income Statement), COGM (Cost of Goods Manufactured), CF (Cash Flow), SCE (Statement of Changes in Equity), RE (Retained Earnings) or Other"
    )]
    pub statement: String,

    #[serde(rename = "Level")]
    #[schemars(
        description = "1 for totals and major lines, 2 for subtotals, 3 for line-item details",
        range(min = 1, max = 3)
    )]
    pub level: u8,

    #[serde(rename = "Account_Name")]
    #[schemars(description = "Account label exactly as it should be displayed")]
    pub account_name: String,

    #[serde(flatten)]
    #[schemars(
        description = "One key per reporting period (e.g. \"2024\", \"2025.3Q(3M)\", \"2025.3Q(Cum)\") holding the amount in base currency units"
    )]
    pub periods: BTreeMap<String, f64>,
}

impl RecordWireFormat {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RecordWireFormat)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Distinct period labels across `records`, in first-seen order.
pub fn period_labels(records: &[Record]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut labels = Vec::new();
    for record in records {
        for label in record.period_values.keys() {
            if seen.insert(label.as_str()) {
                labels.push(label.clone());
            }
        }
    }
    labels
}
