use crate::error::Result;
use crate::report::{ReportView, RowStyle, StatementTable};
use crate::schema::HierarchyLevel;

/// Formats an amount with thousands separators and no decimals.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && grouped != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Plain-text rendering for terminals. Totals are prefixed with `■`, subtotals
/// with `□`; detail rows are indented.
pub fn render_text(view: &ReportView) -> String {
    let mut out = String::new();
    for table in &view.tables {
        out.push_str(&format!(
            "== {} {} ==\n",
            table.label,
            view.units_annotation()
        ));
        out.push_str(&render_table_text(table));
        out.push('\n');
    }
    out
}

fn render_table_text(table: &StatementTable) -> String {
    let header = table.columns();
    let body: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            let marker = match row.level {
                HierarchyLevel::Total => "■ ",
                HierarchyLevel::Subtotal => "□ ",
                HierarchyLevel::Detail => "  ",
            };
            let mut cells = vec![format!("{}{}", marker, row.account_name)];
            cells.extend(row.values.iter().map(|v| format_amount(*v)));
            cells
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            std::iter::once(&header[col])
                .chain(body.iter().map(|cells| &cells[col]))
                .map(|cell| display_width(cell))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let mut push_line = |cells: &[String]| {
        let line: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                let pad = " ".repeat(widths[col].saturating_sub(display_width(cell)));
                if col == 0 {
                    format!("{}{}", cell, pad)
                } else {
                    format!("{}{}", pad, cell)
                }
            })
            .collect();
        out.push_str(line.join(" | ").trim_end());
        out.push('\n');
    };

    push_line(&header);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&rule);
    for cells in &body {
        push_line(cells);
    }
    out
}

/// Terminal column width: Hangul and other wide characters take two cells.
fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match c as u32 {
            0x1100..=0x115F | 0x2E80..=0xA4CF | 0xAC00..=0xD7A3 | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F | 0xFF00..=0xFF60 | 0xFFE0..=0xFFE6 => 2,
            _ => 1,
        })
        .sum()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Self-contained HTML page, one section per statement with tab links.
pub fn render_html(view: &ReportView) -> String {
    let mut nav = String::new();
    let mut sections = String::new();

    for (idx, table) in view.tables.iter().enumerate() {
        let anchor = format!("statement-{}", idx);
        nav.push_str(&format!(
            "        <a href=\"#{}\">{}</a>\n",
            anchor,
            escape_html(&table.label)
        ));

        let mut head = String::new();
        for column in table.columns() {
            head.push_str(&format!("<th>{}</th>", escape_html(&column)));
        }

        let mut body = String::new();
        for row in &table.rows {
            let style = RowStyle::for_level(row.level).css();
            body.push_str(&format!(
                "            <tr class=\"level-{}\" style=\"{}\"><td>{}</td>",
                row.level.as_u8(),
                style,
                escape_html(&row.account_name)
            ));
            for value in &row.values {
                body.push_str(&format!("<td class=\"num\">{}</td>", format_amount(*value)));
            }
            body.push_str("</tr>\n");
        }

        sections.push_str(&format!(
            r#"    <section id="{anchor}">
        <h2>{label}</h2>
        <p class="unit">{unit}</p>
        <table>
            <thead><tr>{head}</tr></thead>
            <tbody>
{body}            </tbody>
        </table>
    </section>
"#,
            anchor = anchor,
            label = escape_html(&table.label),
            unit = escape_html(&view.units_annotation()),
            head = head,
            body = body,
        ));
    }

    format!(
        r##"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Consolidated Financial Statements</title>
    <style>
        body {{ font-family: sans-serif; margin: 2rem; }}
        nav a {{ margin-right: 1rem; }}
        table {{ border-collapse: collapse; width: 100%; }}
        th, td {{ border: 1px solid #e6e6e6; padding: 4px 8px; }}
        th {{ background: #f9f9f9; }}
        td.num {{ text-align: right; }}
        .unit {{ font-style: italic; font-weight: bold; }}
    </style>
</head>
<body>
    <nav>
{nav}    </nav>
{sections}</body>
</html>
"##,
        lang = match view.locale {
            crate::locale::ReportLocale::Korean => "ko",
            crate::locale::ReportLocale::English => "en",
        },
        nav = nav,
        sections = sections,
    )
}

/// CSV of the current view: `Statement`, `Level`, then the account column and
/// the union of period columns in chronological order. Used as model context.
pub fn view_to_csv(view: &ReportView) -> Result<String> {
    let periods = crate::columns::sequence_periods(
        view.tables.iter().flat_map(|t| t.periods.iter()),
    );

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec![
        crate::schema::STATEMENT_COLUMN.to_string(),
        crate::schema::LEVEL_COLUMN.to_string(),
        crate::schema::ACCOUNT_COLUMN.to_string(),
    ];
    header.extend(periods.iter().cloned());
    writer.write_record(&header)?;

    for table in &view.tables {
        for row in &table.rows {
            let mut cells = vec![
                table.code.as_code().to_string(),
                row.level.as_u8().to_string(),
                row.account_name.clone(),
            ];
            for period in &periods {
                let value = table
                    .periods
                    .iter()
                    .position(|p| p == period)
                    .map(|idx| row.values[idx])
                    .unwrap_or(0.0);
                cells.push(value.to_string());
            }
            writer.write_record(&cells)?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::ConsolidatorError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::ReportLocale;
    use crate::report::build_view;
    use crate::scaling::DisplayUnit;
    use crate::schema::Record;

    fn view() -> ReportView {
        let records = vec![
            Record::new("BS", HierarchyLevel::Total, "Total <assets>")
                .with_value("2023", 1_234_567.0)
                .with_value("2024", 2_000_000.0),
            Record::new("BS", HierarchyLevel::Detail, "Cash")
                .with_value("2023", -4_500.0),
            Record::new("IS", HierarchyLevel::Subtotal, "Operating income")
                .with_value("2024.1Q", 999.0),
        ];
        build_view(&records, DisplayUnit::Won, ReportLocale::English)
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1_234_567.4), "1,234,567");
        assert_eq!(format_amount(-4_500.0), "-4,500");
        assert_eq!(format_amount(-0.2), "0");
        assert_eq!(format_amount(5.0), "5");
        assert_eq!(format_amount(12.7), "13");
    }

    #[test]
    fn test_text_view() {
        let text = render_text(&view());
        assert!(text.contains("== Balance Sheet (Unit: KRW) =="));
        assert!(text.contains("■ Total <assets>"));
        assert!(text.contains("1,234,567"));
        assert!(text.contains("-4,500"));
        assert!(text.contains("□ Operating income"));
        let header = text.lines().nth(1).unwrap();
        assert!(header.starts_with("Account_Name"));
    }

    #[test]
    fn test_display_width_counts_hangul_double() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("자산"), 4);
    }

    #[test]
    fn test_html_view_escapes_and_styles() {
        let html = render_html(&view());
        assert!(html.contains("Total &lt;assets&gt;"));
        assert!(html.contains("background-color: #1f77b4; color: white; font-weight: bold;"));
        assert!(html.contains("<th>Account_Name</th><th>2023</th><th>2024</th>"));
        assert!(html.contains("href=\"#statement-1\">Income Statement</a>"));
        assert!(html.contains("<html lang=\"en\">"));
    }

    #[test]
    fn test_csv_view() {
        let csv = view_to_csv(&view()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Statement,Level,Account_Name,2023,2024,2024.1Q"
        );
        assert_eq!(lines.next().unwrap(), "BS,1,Total <assets>,1234567,2000000,0");
        assert_eq!(lines.next().unwrap(), "BS,3,Cash,-4500,0,0");
        assert_eq!(lines.next().unwrap(), "IS,2,Operating income,0,0,999");
    }
}
