use crate::period::PeriodKey;
use crate::schema::{ACCOUNT_COLUMN, LEVEL_COLUMN, STATEMENT_COLUMN};
use std::collections::HashSet;

fn is_metadata_column(column: &str) -> bool {
    column == ACCOUNT_COLUMN || column == STATEMENT_COLUMN || column == LEVEL_COLUMN
}

/// Period columns of a sub-table, oldest first, each emitted once.
pub fn sequence_periods<I, S>(columns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut keyed: Vec<PeriodKey> = columns
        .into_iter()
        .filter_map(|column| {
            let column = column.as_ref();
            if is_metadata_column(column) || !seen.insert(column.to_string()) {
                None
            } else {
                Some(PeriodKey::parse(column))
            }
        })
        .collect();

    keyed.sort();
    keyed.into_iter().map(|key| key.label).collect()
}

/// Display column order for a sub-table: the account column, then its
/// period columns in chronological order.
///
/// `Statement` and `Level` are bookkeeping and never returned.
pub fn sequence_columns<I, S>(columns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ordered = vec![ACCOUNT_COLUMN.to_string()];
    ordered.extend(sequence_periods(columns));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_years_and_quarters() {
        let ordered = sequence_columns(["Account_Name", "2023", "2025.3Q(Cum)", "2025.1Q", "2024"]);
        assert_eq!(
            ordered,
            vec!["Account_Name", "2023", "2024", "2025.1Q", "2025.3Q(Cum)"]
        );
    }

    #[test]
    fn test_metadata_columns_excluded() {
        let ordered = sequence_columns(["Level", "2024", "Statement", "Account_Name", "2023"]);
        assert_eq!(ordered, vec!["Account_Name", "2023", "2024"]);
    }

    #[test]
    fn test_account_first_even_when_absent_from_input() {
        let ordered = sequence_columns(["2024"]);
        assert_eq!(ordered, vec!["Account_Name", "2024"]);
        assert_eq!(sequence_columns(Vec::<String>::new()), vec!["Account_Name"]);
    }

    #[test]
    fn test_duplicates_removed() {
        let ordered = sequence_columns(["2024", "2023", "2024", "Account_Name", "Account_Name"]);
        assert_eq!(ordered, vec!["Account_Name", "2023", "2024"]);
    }

    #[test]
    fn test_quarter_slices_then_cumulative() {
        let ordered = sequence_periods([
            "2025.3Q(Cum)",
            "Notes",
            "2025.3Q(3M)",
            "2024",
            "2025.2Q(Cum)",
            "2025.2Q(3M)",
        ]);
        assert_eq!(
            ordered,
            vec![
                "2024",
                "2025.2Q(3M)",
                "2025.2Q(Cum)",
                "2025.3Q(3M)",
                "2025.3Q(Cum)",
                "Notes"
            ]
        );
    }
}
