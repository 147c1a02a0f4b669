//! Sort keys for free-text period labels such as `2023`, `2025.3Q(3M)` or
//! `2025.3Q(Cum)`.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Year assigned to labels without a 4-digit run, so they sort after every dated label.
pub const UNDATED_YEAR: u32 = 9999;

/// Quarter markers and their position on a 1..=12 month scale.
const QUARTER_MARKERS: [(&str, u8); 4] = [("1Q", 1), ("2Q", 4), ("3Q", 7), ("4Q", 10)];

/// Tokens marking a year-to-date column. `누적` is the Korean term.
const CUMULATIVE_MARKERS: [&str; 3] = ["누적", "Cum", "Year"];

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9]{4}").expect("year pattern is a valid regex"))
}

/// Chronological sort key of a period label.
///
/// Field order is the comparison order: year, then sub-period ordinal, then
/// the cumulative flag (3-month slices before year-to-date), then the label
/// itself so distinct labels never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    pub year: u32,
    pub sub_period: u8,
    pub cumulative: bool,
    pub label: String,
}

impl PeriodKey {
    /// Total over arbitrary input.
    pub fn parse(label: &str) -> Self {
        let year = year_pattern()
            .find(label)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(UNDATED_YEAR);

        let sub_period = QUARTER_MARKERS
            .iter()
            .find(|(marker, _)| label.contains(marker))
            .map(|(_, ordinal)| *ordinal)
            .unwrap_or(0);

        let cumulative = CUMULATIVE_MARKERS
            .iter()
            .any(|marker| label.contains(marker));

        Self {
            year,
            sub_period,
            cumulative,
            label: label.to_string(),
        }
    }

    pub fn is_dated(&self) -> bool {
        self.year != UNDATED_YEAR
    }

    /// Tuple form `(year, sub_period, cumulative as 0/1, label)`.
    pub fn as_tuple(&self) -> (u32, u8, u8, &str) {
        (
            self.year,
            self.sub_period,
            u8::from(self.cumulative),
            self.label.as_str(),
        )
    }
}

/// Compares two labels chronologically.
pub fn compare_periods(a: &str, b: &str) -> Ordering {
    PeriodKey::parse(a).cmp(&PeriodKey::parse(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_is_first_four_digit_run() {
        assert_eq!(PeriodKey::parse("2023").year, 2023);
        assert_eq!(PeriodKey::parse("FY2024 audited").year, 2024);
        assert_eq!(PeriodKey::parse("2025.3Q(3M)").year, 2025);
        // First run wins even when more digits follow.
        assert_eq!(PeriodKey::parse("202412").year, 2024);
        assert_eq!(PeriodKey::parse("2019 vs 2020").year, 2019);
    }

    #[test]
    fn test_undated_labels_sort_last() {
        let undated = PeriodKey::parse("Budget");
        assert_eq!(undated.year, UNDATED_YEAR);
        assert!(!undated.is_dated());
        assert!(PeriodKey::parse("2099.4Q(Cum)") < undated);
        assert!(PeriodKey::parse("'23") > PeriodKey::parse("2023"));
    }

    #[test]
    fn test_quarter_ordinals() {
        assert_eq!(PeriodKey::parse("2025.1Q").sub_period, 1);
        assert_eq!(PeriodKey::parse("2025.2Q").sub_period, 4);
        assert_eq!(PeriodKey::parse("2025.3Q(3M)").sub_period, 7);
        assert_eq!(PeriodKey::parse("2025.4Q").sub_period, 10);
        assert_eq!(PeriodKey::parse("2025").sub_period, 0);
    }

    #[test]
    fn test_quarters_order_within_year() {
        let mut labels = vec!["2024.4Q", "2024.2Q", "2024", "2024.3Q", "2024.1Q"];
        labels.sort_by(|a, b| compare_periods(a, b));
        assert_eq!(labels, vec!["2024", "2024.1Q", "2024.2Q", "2024.3Q", "2024.4Q"]);
    }

    #[test]
    fn test_three_month_before_cumulative() {
        for (slice, cumulative) in [
            ("2025.3Q(3M)", "2025.3Q(Cum)"),
            ("2025.3Q(3개월)", "2025.3Q(누적)"),
            ("2025.2Q", "2025.2Q Year to date"),
        ] {
            let slice_key = PeriodKey::parse(slice);
            let cum_key = PeriodKey::parse(cumulative);
            assert!(!slice_key.cumulative, "{slice} should not be cumulative");
            assert!(cum_key.cumulative, "{cumulative} should be cumulative");
            assert!(slice_key < cum_key);
        }
    }

    #[test]
    fn test_label_breaks_ties() {
        let a = PeriodKey::parse("2024 (restated)");
        let b = PeriodKey::parse("2024 (original)");
        assert_eq!(a.as_tuple().0, b.as_tuple().0);
        assert_eq!(compare_periods("2024 (original)", "2024 (restated)"), Ordering::Less);
        assert_eq!(compare_periods("2024", "2024"), Ordering::Equal);
    }

    #[test]
    fn test_total_over_odd_input() {
        for label in ["", "   ", "Q", "١٢٣٤", "🙂2023🙂", "1Q2Q3Q"] {
            let _ = PeriodKey::parse(label);
        }
        // Non-ASCII digits are not a year.
        assert_eq!(PeriodKey::parse("١٢٣٤").year, UNDATED_YEAR);
        assert_eq!(PeriodKey::parse("🙂2023🙂").year, 2023);
        // The first marker in 1Q..4Q order wins.
        assert_eq!(PeriodKey::parse("1Q2Q3Q").sub_period, 1);
    }
}
