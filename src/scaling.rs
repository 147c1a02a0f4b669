use crate::error::ConsolidatorError;
use crate::locale::ReportLocale;
use crate::schema::Record;
use log::debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Currency unit the report is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayUnit {
    #[default]
    Won,
    Thousand,
    Million,
    HundredMillion,
}

impl DisplayUnit {
    pub const ALL: [DisplayUnit; 4] = [
        DisplayUnit::Won,
        DisplayUnit::Thousand,
        DisplayUnit::Million,
        DisplayUnit::HundredMillion,
    ];

    /// Name accepted on the command line and in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            DisplayUnit::Won => "won",
            DisplayUnit::Thousand => "thousand",
            DisplayUnit::Million => "million",
            DisplayUnit::HundredMillion => "hundred-million",
        }
    }

    /// Comma-separated list of every unit name.
    pub fn choices() -> String {
        Self::ALL
            .iter()
            .map(|unit| unit.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn divisor(self) -> f64 {
        match self {
            DisplayUnit::Won => 1.0,
            DisplayUnit::Thousand => 1_000.0,
            DisplayUnit::Million => 1_000_000.0,
            DisplayUnit::HundredMillion => 100_000_000.0,
        }
    }

    pub fn label(self, locale: ReportLocale) -> &'static str {
        match (locale, self) {
            (ReportLocale::Korean, DisplayUnit::Won) => "원",
            (ReportLocale::Korean, DisplayUnit::Thousand) => "천원",
            (ReportLocale::Korean, DisplayUnit::Million) => "백만원",
            (ReportLocale::Korean, DisplayUnit::HundredMillion) => "억원",
            (ReportLocale::English, DisplayUnit::Won) => "KRW",
            (ReportLocale::English, DisplayUnit::Thousand) => "KRW thousands",
            (ReportLocale::English, DisplayUnit::Million) => "KRW millions",
            (ReportLocale::English, DisplayUnit::HundredMillion) => "KRW hundred millions",
        }
    }
}

impl FromStr for DisplayUnit {
    type Err = ConsolidatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '_', ','], "");
        match normalized.as_str() {
            "won" | "krw" | "1" | "원" => Ok(DisplayUnit::Won),
            "thousand" | "thousands" | "k" | "1000" | "천원" => Ok(DisplayUnit::Thousand),
            "million" | "millions" | "m" | "1000000" | "백만원" => Ok(DisplayUnit::Million),
            "hundred-million" | "hundredmillion" | "100m" | "100000000" | "억원" => {
                Ok(DisplayUnit::HundredMillion)
            }
            _ => Err(ConsolidatorError::InvalidUnit {
                value: s.to_string(),
                expected: Self::choices(),
            }),
        }
    }
}

/// Divides every period value by `divisor`. A divisor of 1 returns an
/// unchanged copy; code, level and name are never touched.
pub fn rescale_by(records: &[Record], divisor: f64) -> Vec<Record> {
    if divisor == 1.0 {
        return records.to_vec();
    }

    records
        .iter()
        .map(|record| {
            let mut scaled = record.clone();
            for value in scaled.period_values.values_mut() {
                *value /= divisor;
            }
            scaled
        })
        .collect()
}

pub fn rescale(records: &[Record], unit: DisplayUnit) -> Vec<Record> {
    debug!(
        "Rescaling {} records by {} ({:?})",
        records.len(),
        unit.divisor(),
        unit
    );
    rescale_by(records, unit.divisor())
}

/// Drops rows whose period values are all zero (or that carry none).
pub fn drop_zero_rows(records: Vec<Record>) -> Vec<Record> {
    let before = records.len();
    let kept: Vec<Record> = records.into_iter().filter(|r| !r.is_all_zero()).collect();
    if kept.len() != before {
        debug!("Dropped {} all-zero rows", before - kept.len());
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::HierarchyLevel;

    fn sample() -> Vec<Record> {
        vec![
            Record::new("IS", HierarchyLevel::Total, "Sales")
                .with_value("2023", 0.0)
                .with_value("2024", 0.0),
            Record::new("IS", HierarchyLevel::Detail, "COGS")
                .with_value("2023", 500.0)
                .with_value("2024", 600.0),
            Record::new("BS", HierarchyLevel::Detail, "Cash")
                .with_value("2023", 5_000_000.0)
                .with_value("2024", -2_500_000.0),
        ]
    }

    #[test]
    fn test_divisor_table() {
        assert_eq!(DisplayUnit::Won.divisor(), 1.0);
        assert_eq!(DisplayUnit::Thousand.divisor(), 1000.0);
        assert_eq!(DisplayUnit::Million.divisor(), 1_000_000.0);
        assert_eq!(DisplayUnit::HundredMillion.divisor(), 100_000_000.0);
    }

    #[test]
    fn test_million_divisor() {
        let records = vec![Record::new("BS", HierarchyLevel::Detail, "Cash").with_value("2023", 5_000_000.0)];
        let scaled = rescale(&records, DisplayUnit::Million);
        assert_eq!(scaled[0].value("2023"), 5.0);
    }

    #[test]
    fn test_rescale_leaves_metadata_and_input_alone() {
        let records = sample();
        let scaled = rescale(&records, DisplayUnit::Thousand);
        for (original, scaled) in records.iter().zip(&scaled) {
            assert_eq!(original.statement_code, scaled.statement_code);
            assert_eq!(original.hierarchy_level, scaled.hierarchy_level);
            assert_eq!(original.account_name, scaled.account_name);
            for (label, value) in &original.period_values {
                assert_eq!(scaled.value(label), value / 1000.0);
            }
        }
        assert_eq!(records[2].value("2023"), 5_000_000.0);
    }

    #[test]
    fn test_unit_divisor_one_is_identity() {
        let records = sample();
        assert_eq!(rescale(&records, DisplayUnit::Won), records);
    }

    #[test]
    fn test_composition_matches_product() {
        let records = sample();
        let twice = rescale_by(&rescale_by(&records, 1000.0), 1000.0);
        let once = rescale(&records, DisplayUnit::Million);
        for (a, b) in twice.iter().zip(&once) {
            for (label, value) in &a.period_values {
                assert!((value - b.value(label)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_rows_dropped_after_rescale() {
        let kept = drop_zero_rows(rescale(&sample(), DisplayUnit::Thousand));
        let names: Vec<&str> = kept.iter().map(|r| r.account_name.as_str()).collect();
        assert_eq!(names, vec!["COGS", "Cash"]);
    }

    #[test]
    fn test_mixed_sign_row_is_kept() {
        let row = Record::new("CF", HierarchyLevel::Detail, "Net")
            .with_value("2023", 100.0)
            .with_value("2024", -100.0);
        assert_eq!(drop_zero_rows(vec![row]).len(), 1);
    }

    #[test]
    fn test_record_without_periods_is_dropped() {
        let row = Record::new("BS", HierarchyLevel::Total, "Header only");
        assert!(drop_zero_rows(vec![row]).is_empty());
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("thousand".parse::<DisplayUnit>().unwrap(), DisplayUnit::Thousand);
        assert_eq!("1,000,000".parse::<DisplayUnit>().unwrap(), DisplayUnit::Million);
        assert_eq!("억원".parse::<DisplayUnit>().unwrap(), DisplayUnit::HundredMillion);
        assert_eq!("Hundred Million".parse::<DisplayUnit>().unwrap(), DisplayUnit::HundredMillion);
        assert!("billion".parse::<DisplayUnit>().is_err());
    }

    #[test]
    fn test_every_unit_name_round_trips() {
        for unit in DisplayUnit::ALL {
            assert_eq!(unit.name().parse::<DisplayUnit>().unwrap(), unit);
        }
    }

    #[test]
    fn test_invalid_unit_lists_choices() {
        let err = "billion".parse::<DisplayUnit>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid display unit 'billion': expected one of won, thousand, million, hundred-million"
        );
    }
}
