use crate::error::ConsolidatorError;
use crate::schema::StatementCode;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Language of statement titles and unit annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLocale {
    #[default]
    Korean,
    English,
}

impl ReportLocale {
    /// Human-readable statement title. Unrecognized codes use the raw code.
    pub fn statement_label<'a>(&self, code: &'a StatementCode) -> &'a str {
        match (self, code) {
            (_, StatementCode::Unrecognized(raw)) => raw.as_str(),
            (ReportLocale::Korean, StatementCode::BalanceSheet) => "재무상태표",
            (ReportLocale::Korean, StatementCode::IncomeStatement) => "손익계산서",
            (ReportLocale::Korean, StatementCode::CostOfGoodsManufactured) => "제조원가명세서",
            (ReportLocale::Korean, StatementCode::CashFlow) => "현금흐름표",
            (ReportLocale::Korean, StatementCode::EquityChange) => "자본변동표",
            (ReportLocale::Korean, StatementCode::RetainedEarnings) => "이익잉여금",
            (ReportLocale::Korean, StatementCode::Other) => "기타",
            (ReportLocale::English, StatementCode::BalanceSheet) => "Balance Sheet",
            (ReportLocale::English, StatementCode::IncomeStatement) => "Income Statement",
            (ReportLocale::English, StatementCode::CostOfGoodsManufactured) => {
                "Cost of Goods Manufactured"
            }
            (ReportLocale::English, StatementCode::CashFlow) => "Cash Flow Statement",
            (ReportLocale::English, StatementCode::EquityChange) => "Changes in Equity",
            (ReportLocale::English, StatementCode::RetainedEarnings) => "Retained Earnings",
            (ReportLocale::English, StatementCode::Other) => "Other",
        }
    }

    /// Text written above each table, e.g. `(단위: 천원)`.
    pub fn units_annotation(&self, unit_label: &str) -> String {
        match self {
            ReportLocale::Korean => format!("(단위: {})", unit_label),
            ReportLocale::English => format!("(Unit: {})", unit_label),
        }
    }
}

impl FromStr for ReportLocale {
    type Err = ConsolidatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "korean" | "ko" | "kr" | "ko-kr" => Ok(ReportLocale::Korean),
            "english" | "en" | "en-us" | "en-gb" => Ok(ReportLocale::English),
            _ => Err(ConsolidatorError::InvalidLocale(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        let ko = ReportLocale::Korean;
        assert_eq!(ko.statement_label(&StatementCode::BalanceSheet), "재무상태표");
        assert_eq!(ko.statement_label(&StatementCode::Other), "기타");
        let en = ReportLocale::English;
        assert_eq!(en.statement_label(&StatementCode::CashFlow), "Cash Flow Statement");
    }

    #[test]
    fn test_unrecognized_code_is_its_own_label() {
        let code = StatementCode::parse("Segment Info");
        assert_eq!(ReportLocale::Korean.statement_label(&code), "Segment Info");
        assert_eq!(ReportLocale::English.statement_label(&code), "Segment Info");
    }

    #[test]
    fn test_units_annotation() {
        assert_eq!(ReportLocale::Korean.units_annotation("백만원"), "(단위: 백만원)");
        assert_eq!(
            ReportLocale::English.units_annotation("KRW millions"),
            "(Unit: KRW millions)"
        );
    }

    #[test]
    fn test_parse_locale() {
        assert_eq!("EN".parse::<ReportLocale>().unwrap(), ReportLocale::English);
        assert_eq!("korean".parse::<ReportLocale>().unwrap(), ReportLocale::Korean);
        assert!("fr".parse::<ReportLocale>().is_err());
    }
}
