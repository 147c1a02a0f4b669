//! Flattens uploaded documents into plain text for the external record source.
//!
//! A document that cannot be read does not abort the batch: its slot in the
//! context holds an `Error reading <name>: <reason>` line instead.

use crate::error::{ConsolidatorError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use std::io::{Cursor, Read};
use std::path::Path;

/// Default cap on the flattened context, in characters.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 200_000;
pub const TRUNCATION_MARKER: &str = "\n...(Data Truncated)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Spreadsheet,
    Csv,
    Pdf,
    Word,
    Text,
}

impl DocumentKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match extension.as_str() {
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(DocumentKind::Spreadsheet),
            "csv" => Some(DocumentKind::Csv),
            "pdf" => Some(DocumentKind::Pdf),
            "docx" | "doc" => Some(DocumentKind::Word),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ConsolidatorError::Extraction {
                document: path.display().to_string(),
                reason: "invalid file name".to_string(),
            })?
            .to_string();
        let bytes = std::fs::read(path)?;
        Ok(Self { name, bytes })
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_name(&self.name)
    }

    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}

/// Extracts one document, returning its labelled text block.
pub fn extract_document(document: &SourceDocument) -> Result<String> {
    let kind = document
        .kind()
        .ok_or_else(|| ConsolidatorError::UnsupportedDocument(document.name.clone()))?;

    let failed = |reason: String| ConsolidatorError::Extraction {
        document: document.name.clone(),
        reason,
    };

    match kind {
        DocumentKind::Spreadsheet => {
            let sheets = spreadsheet_to_csv(&document.bytes)?;
            Ok(sheets
                .into_iter()
                .map(|(sheet, csv)| format!("File: {} | Sheet: {}\n{}", document.name, sheet, csv))
                .collect::<Vec<_>>()
                .join("\n\n"))
        }
        DocumentKind::Csv => {
            let csv = normalize_csv(&document.bytes)?;
            Ok(format!("File: {}\n{}", document.name, csv))
        }
        DocumentKind::Pdf => {
            let text = pdf_text(&document.bytes).map_err(failed)?;
            Ok(format!("File: {} (PDF Content)\n{}", document.name, text))
        }
        DocumentKind::Word => {
            let text = docx_text(&document.bytes).map_err(failed)?;
            Ok(format!("File: {} (Word Content)\n{}", document.name, text))
        }
        DocumentKind::Text => {
            let text = String::from_utf8_lossy(&document.bytes);
            Ok(format!("File: {}\n{}", document.name, text))
        }
    }
}

/// Like [`extract_document`], but failures become inline text.
pub fn extract_or_report(document: &SourceDocument) -> String {
    match extract_document(document) {
        Ok(text) => {
            debug!("Extracted {} chars from {}", text.chars().count(), document.name);
            text
        }
        Err(e) => {
            warn!("Extraction failed for {}: {}", document.name, e);
            match e {
                ConsolidatorError::Extraction { .. } => e.to_string(),
                other => format!("Error reading {}: {}", document.name, other),
            }
        }
    }
}

/// Joins every document's text and caps the result at `max_chars` characters.
pub fn build_context(documents: &[SourceDocument], max_chars: usize) -> String {
    let mut context = String::new();
    for document in documents {
        context.push_str(&extract_or_report(document));
        context.push_str("\n\n");
    }
    truncate_context(context, max_chars)
}

pub fn truncate_context(context: String, max_chars: usize) -> String {
    match context.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            debug!("Context truncated at {} chars", max_chars);
            let mut truncated = context[..byte_idx].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => context,
    }
}

fn spreadsheet_to_csv(bytes: &[u8]) -> Result<Vec<(String, String)>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let mut sheets = Vec::new();

    for sheet_name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&sheet_name)?;
        let grid: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        sheets.push((sheet_name, grid_to_csv(prune_empty(grid))?));
    }

    Ok(sheets)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

/// Drops rows and columns that hold nothing but blanks.
fn prune_empty(grid: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let rows: Vec<Vec<String>> = grid
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();

    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let keep: Vec<bool> = (0..width)
        .map(|col| {
            rows.iter()
                .any(|row| row.get(col).is_some_and(|cell| !cell.trim().is_empty()))
        })
        .collect();

    rows.into_iter()
        .map(|row| {
            (0..width)
                .filter(|col| keep[*col])
                .map(|col| row.get(col).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}

fn grid_to_csv(grid: Vec<Vec<String>>) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in grid {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ConsolidatorError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn normalize_csv(bytes: &[u8]) -> Result<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    grid_to_csv(prune_empty(grid))
}

fn pdf_text(bytes: &[u8]) -> std::result::Result<String, String> {
    // pdf-extract panics on some malformed inputs; keep that inside this document.
    let bytes = bytes.to_vec();
    std::panic::catch_unwind(move || pdf_extract::extract_text_from_mem(&bytes))
        .map_err(|_| "PDF parser aborted on malformed input".to_string())?
        .map_err(|e| e.to_string())
}

/// Paragraph text of a `.docx`, one paragraph per line.
fn docx_text(bytes: &[u8]) -> std::result::Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| format!("not a Word (docx) package: {}", e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("missing word/document.xml: {}", e))?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    let mut reader = XmlReader::from_str(&xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                current.push_str(&String::from_utf8_lossy(e));
            }
            Ok(Event::GeneralRef(ref e)) if in_text => {
                let name = String::from_utf8_lossy(e).into_owned();
                if let Some(ch) = resolve_entity(&name) {
                    current.push(ch);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("malformed document.xml: {}", e)),
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}</w:body></w:document>",
            body
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_name("a.XLSX"), Some(DocumentKind::Spreadsheet));
        assert_eq!(DocumentKind::from_name("b.xls"), Some(DocumentKind::Spreadsheet));
        assert_eq!(DocumentKind::from_name("c.csv"), Some(DocumentKind::Csv));
        assert_eq!(DocumentKind::from_name("d.pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_name("e.doc"), Some(DocumentKind::Word));
        assert_eq!(DocumentKind::from_name("f.txt"), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_name("g.png"), None);
        assert_eq!(DocumentKind::from_name("noext"), None);
    }

    #[test]
    fn test_text_document() {
        let doc = SourceDocument::new("notes.txt", "매출액 1,000".as_bytes());
        assert_eq!(extract_document(&doc).unwrap(), "File: notes.txt\n매출액 1,000");
    }

    #[test]
    fn test_csv_drops_blank_rows_and_columns() {
        let doc = SourceDocument::new("tb.csv", "Account,,2024\n,,\nCash,,100\n".as_bytes());
        let text = extract_document(&doc).unwrap();
        assert_eq!(text, "File: tb.csv\nAccount,2024\nCash,100\n");
    }

    #[test]
    fn test_docx_paragraphs() {
        let doc = SourceDocument::new("memo.docx", docx_bytes(&["Revenue 2024", "R&amp;D 50"]));
        let text = extract_document(&doc).unwrap();
        assert_eq!(text, "File: memo.docx (Word Content)\nRevenue 2024\nR&D 50");
    }

    #[test]
    fn test_legacy_doc_reported_inline() {
        let doc = SourceDocument::new("old.doc", vec![0xD0, 0xCF, 0x11, 0xE0]);
        let text = extract_or_report(&doc);
        assert!(text.starts_with("Error reading old.doc:"), "{text}");
    }

    #[test]
    fn test_unsupported_reported_inline() {
        let doc = SourceDocument::new("scan.png", vec![1, 2, 3]);
        assert_eq!(
            extract_or_report(&doc),
            "Error reading scan.png: Unsupported document type: scan.png"
        );
    }

    #[test]
    fn test_broken_pdf_reported_inline() {
        let doc = SourceDocument::new("broken.pdf", b"not a pdf".to_vec());
        assert!(extract_or_report(&doc).starts_with("Error reading broken.pdf:"));
    }

    #[test]
    fn test_failure_does_not_abort_batch() {
        let docs = vec![
            SourceDocument::new("broken.xlsx", b"garbage".to_vec()),
            SourceDocument::new("ok.txt", b"Cash 100".to_vec()),
        ];
        let context = build_context(&docs, DEFAULT_MAX_CONTEXT_CHARS);
        assert!(context.contains("Error reading broken.xlsx"));
        assert!(context.contains("File: ok.txt\nCash 100"));
    }

    #[test]
    fn test_truncation_counts_characters() {
        let context = truncate_context("가나다라마".to_string(), 3);
        assert_eq!(context, format!("가나다{}", TRUNCATION_MARKER));
        assert_eq!(truncate_context("abc".to_string(), 3), "abc");
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp"), Some('&'));
        assert_eq!(resolve_entity("#65"), Some('A'));
        assert_eq!(resolve_entity("#xAC00"), Some('가'));
        assert_eq!(resolve_entity("nbsp"), None);
    }
}
