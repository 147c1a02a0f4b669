use crate::locale::ReportLocale;
use crate::schema::{Record, StatementCode};
use std::collections::HashSet;

/// Longest sheet title the spreadsheet export writes.
pub const MAX_SHEET_TITLE_CHARS: usize = 30;

/// Characters a spreadsheet sheet name may not contain.
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// The records of one statement, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementPartition {
    pub code: StatementCode,
    pub records: Vec<Record>,
}

impl StatementPartition {
    pub fn label(&self, locale: ReportLocale) -> &str {
        locale.statement_label(&self.code)
    }
}

/// Splits records by statement code.
///
/// Partitions come out in order of each code's first appearance and rows keep
/// their input order, which carries the accounting presentation order.
pub fn partition_statements(records: &[Record]) -> Vec<StatementPartition> {
    let mut partitions: Vec<StatementPartition> = Vec::new();

    for record in records {
        match partitions
            .iter_mut()
            .find(|p| p.code == record.statement_code)
        {
            Some(partition) => partition.records.push(record.clone()),
            None => partitions.push(StatementPartition {
                code: record.statement_code.clone(),
                records: vec![record.clone()],
            }),
        }
    }

    partitions
}

/// Builds a sheet title from a display label: forbidden characters replaced,
/// truncated to [`MAX_SHEET_TITLE_CHARS`], and made unique against `taken`
/// (case-insensitively, as spreadsheet applications compare them).
pub fn sheet_title(label: &str, taken: &mut HashSet<String>) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    let base: String = if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.chars().take(MAX_SHEET_TITLE_CHARS).collect()
    };

    let mut candidate = base.clone();
    let mut suffix = 2;
    while taken.contains(&candidate.to_lowercase()) {
        let tag = format!(" ({})", suffix);
        let room = MAX_SHEET_TITLE_CHARS.saturating_sub(tag.chars().count());
        candidate = base.chars().take(room).collect::<String>() + &tag;
        suffix += 1;
    }

    taken.insert(candidate.to_lowercase());
    candidate
}
