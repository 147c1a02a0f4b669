//! Assembly of the display/export view: rescale, drop empty rows, partition by
//! statement, and lay each statement out as a table with chronological columns.

use crate::columns::sequence_periods;
use crate::locale::ReportLocale;
use crate::partition::{partition_statements, sheet_title};
use crate::scaling::{drop_zero_rows, rescale, DisplayUnit};
use crate::schema::{period_labels, HierarchyLevel, Record, StatementCode, ACCOUNT_COLUMN};
use log::info;
use serde::Serialize;
use std::collections::HashSet;

/// Fill colour of total rows (`#1F77B4`).
pub const TOTAL_FILL: u32 = 0x1F77B4;
/// Fill colour of subtotal rows (`#AEC7E8`).
pub const SUBTOTAL_FILL: u32 = 0xAEC7E8;
pub const WHITE: u32 = 0xFFFFFF;
pub const BLACK: u32 = 0x000000;

/// Visual emphasis for a row tier, shared by every output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowStyle {
    pub fill: Option<u32>,
    pub font_color: u32,
    pub bold: bool,
}

impl RowStyle {
    pub fn for_level(level: HierarchyLevel) -> Self {
        match level {
            HierarchyLevel::Total => RowStyle {
                fill: Some(TOTAL_FILL),
                font_color: WHITE,
                bold: true,
            },
            HierarchyLevel::Subtotal => RowStyle {
                fill: Some(SUBTOTAL_FILL),
                font_color: BLACK,
                bold: true,
            },
            HierarchyLevel::Detail => RowStyle {
                fill: None,
                font_color: BLACK,
                bold: false,
            },
        }
    }

    /// Inline CSS for HTML output.
    pub fn css(&self) -> String {
        let mut css = String::new();
        if let Some(fill) = self.fill {
            css.push_str(&format!("background-color: #{:06x}; ", fill));
        }
        let color = match self.font_color {
            WHITE => "white".to_string(),
            BLACK => "black".to_string(),
            other => format!("#{:06x}", other),
        };
        css.push_str(&format!("color: {};", color));
        if self.bold {
            css.push_str(" font-weight: bold;");
        }
        css
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub level: HierarchyLevel,
    pub account_name: String,
    /// One value per period column, aligned with [`StatementTable::periods`].
    pub values: Vec<f64>,
}

/// One statement laid out for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementTable {
    pub code: StatementCode,
    /// Full display label (tab title).
    pub label: String,
    /// Sanitized, unique, at most 30 characters.
    pub sheet_title: String,
    pub periods: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl StatementTable {
    /// Header row: account column then period columns.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.periods.len() + 1);
        columns.push(ACCOUNT_COLUMN.to_string());
        columns.extend(self.periods.iter().cloned());
        columns
    }

    pub fn is_period_column(&self, column: &str) -> bool {
        self.periods.iter().any(|p| p == column)
    }
}

/// Every statement of a loaded record set at one display unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub unit: DisplayUnit,
    pub locale: ReportLocale,
    pub tables: Vec<StatementTable>,
}

impl ReportView {
    pub fn unit_label(&self) -> &'static str {
        self.unit.label(self.locale)
    }

    pub fn units_annotation(&self) -> String {
        self.locale.units_annotation(self.unit_label())
    }

    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Derives the view from `records` without modifying them.
pub fn build_view(records: &[Record], unit: DisplayUnit, locale: ReportLocale) -> ReportView {
    let visible = drop_zero_rows(rescale(records, unit));
    let partitions = partition_statements(&visible);

    let mut taken_titles = HashSet::new();
    let tables: Vec<StatementTable> = partitions
        .into_iter()
        .map(|partition| {
            let label = partition.label(locale).to_string();
            let sheet_title = sheet_title(&label, &mut taken_titles);
            let periods = sequence_periods(period_labels(&partition.records));
            let rows = partition
                .records
                .iter()
                .map(|record| TableRow {
                    level: record.hierarchy_level,
                    account_name: record.account_name.clone(),
                    values: periods.iter().map(|p| record.value(p)).collect(),
                })
                .collect();

            StatementTable {
                code: partition.code,
                label,
                sheet_title,
                periods,
                rows,
            }
        })
        .collect();

    info!(
        "Built report view: {} statements, {} of {} rows visible at unit {:?}",
        tables.len(),
        tables.iter().map(|t| t.rows.len()).sum::<usize>(),
        records.len(),
        unit
    );

    ReportView {
        unit,
        locale,
        tables,
    }
}
