//! Spreadsheet export: one worksheet per statement.
//!
//! Sheet layout:
//! - row 1: units annotation (bold italic)
//! - row 2: header (account column, then periods)
//! - row 3 onward: data, styled per hierarchy level

use crate::error::Result;
use crate::report::{ReportView, RowStyle, StatementTable};
use log::info;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use std::path::Path;

pub const UNITS_ROW: u32 = 0;
pub const HEADER_ROW: u32 = 1;
pub const FIRST_DATA_ROW: u32 = 2;
pub const ACCOUNT_COLUMN_WIDTH: f64 = 30.0;
/// Thousands-separated integer.
pub const AMOUNT_FORMAT: &str = "#,##0";

pub fn build_workbook(view: &ReportView) -> Result<Workbook> {
    let mut workbook = Workbook::new();

    for table in &view.tables {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&table.sheet_title)?;
        write_statement_sheet(worksheet, table, &view.units_annotation())?;
    }

    Ok(workbook)
}

fn level_format(style: RowStyle) -> Format {
    let mut format = Format::new().set_font_color(Color::RGB(style.font_color));
    if let Some(fill) = style.fill {
        format = format.set_background_color(Color::RGB(fill));
    }
    if style.bold {
        format = format.set_bold();
    }
    format
}

fn write_statement_sheet(
    worksheet: &mut Worksheet,
    table: &StatementTable,
    units_annotation: &str,
) -> Result<()> {
    let units_format = Format::new().set_bold().set_italic();
    worksheet.write_string_with_format(UNITS_ROW, 0, units_annotation, &units_format)?;

    let header_format = Format::new().set_bold();
    let columns = table.columns();
    for (col, name) in columns.iter().enumerate() {
        worksheet.write_string_with_format(HEADER_ROW, col as u16, name, &header_format)?;
    }

    for (offset, row) in table.rows.iter().enumerate() {
        let excel_row = FIRST_DATA_ROW + offset as u32;
        let text_format = level_format(RowStyle::for_level(row.level));
        let amount_format = text_format.clone().set_num_format(AMOUNT_FORMAT);

        for (col, name) in columns.iter().enumerate() {
            if col == 0 {
                worksheet.write_string_with_format(excel_row, 0, &row.account_name, &text_format)?;
                continue;
            }
            let value = row.values[col - 1];
            // Amount format only on period columns.
            let format = if table.is_period_column(name) {
                &amount_format
            } else {
                &text_format
            };
            worksheet.write_number_with_format(excel_row, col as u16, value, format)?;
        }
    }

    worksheet.set_column_width(0, ACCOUNT_COLUMN_WIDTH)?;
    Ok(())
}

/// Serializes the workbook to xlsx bytes.
pub fn export_to_buffer(view: &ReportView) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(view)?;
    let bytes = workbook.save_to_buffer()?;
    info!(
        "Exported {} sheets ({} bytes) at unit {}",
        view.tables.len(),
        bytes.len(),
        view.unit_label()
    );
    Ok(bytes)
}

pub fn export_to_path(view: &ReportView, path: &Path) -> Result<()> {
    let mut workbook = build_workbook(view)?;
    workbook.save(path)?;
    info!("Exported {} sheets to {}", view.tables.len(), path.display());
    Ok(())
}

/// `Financial_Report_<unit>.xlsx`.
pub fn default_file_name(view: &ReportView) -> String {
    format!("Financial_Report_{}.xlsx", view.unit_label().replace(' ', "_"))
}
