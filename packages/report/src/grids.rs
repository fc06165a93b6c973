//! Loading table grids from report files.
//!
//! Two inputs are supported:
//!
//! - **PDF**: page text is extracted with [`pdf_extract`], blank lines
//!   separate tables, and runs of two or more spaces (or tabs) separate
//!   cells. This recovers the bordered tables of the audit export well
//!   enough for the label matcher; it is not a general layout engine.
//! - **JSON**: grids already extracted by an external table detector,
//!   stored as `[[[cell, ...], ...], ...]` (grid → row → cell).

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use rmm_audit_report_models::{Row, TableGrid};

use crate::ReportError;

/// Splits a text line into cells.
static CELL_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+|\s{2,}").expect("valid regex"));

/// Options for reading grids out of a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfGridOptions {
    /// Number of leading pages to skip (the export's cover page).
    pub skip_pages: usize,
}

impl Default for PdfGridOptions {
    fn default() -> Self {
        Self { skip_pages: 1 }
    }
}

/// Loads grids from `path`, choosing the reader by file extension.
///
/// # Errors
///
/// Returns [`ReportError::UnsupportedFileType`] for extensions other than
/// `pdf` and `json`, or any error of the selected reader.
pub fn load_grids(path: &Path, options: &PdfGridOptions) -> Result<Vec<TableGrid>, ReportError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => read_pdf_grids(path, options),
        Some("json") => read_json_grids(path),
        _ => Err(ReportError::UnsupportedFileType {
            file_name: display_name(path),
        }),
    }
}

/// Extracts grids from a PDF file.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be read or text extraction
/// fails.
pub fn read_pdf_grids(path: &Path, options: &PdfGridOptions) -> Result<Vec<TableGrid>, ReportError> {
    let bytes = std::fs::read(path)?;

    log::debug!("Read {} bytes from {}", bytes.len(), path.display());

    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| ReportError::Extraction(format!("{}: {e}", path.display())))?;

    let grids: Vec<TableGrid> = pages
        .iter()
        .skip(options.skip_pages)
        .flat_map(|page| grids_from_text(page))
        .collect();

    log::debug!(
        "Extracted {} grids from {} page(s) of {}",
        grids.len(),
        pages.len().saturating_sub(options.skip_pages),
        path.display()
    );

    Ok(grids)
}

/// Loads pre-extracted grids from a JSON file.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be read or is not a list of
/// grids.
pub fn read_json_grids(path: &Path) -> Result<Vec<TableGrid>, ReportError> {
    let text = std::fs::read_to_string(path)?;
    parse_json_grids(&text)
}

/// Parses grids from JSON text, cleaning every cell.
///
/// # Errors
///
/// Returns [`ReportError::Json`] if the text is not a list of grids.
pub fn parse_json_grids(text: &str) -> Result<Vec<TableGrid>, ReportError> {
    let raw: Vec<Vec<Row>> = serde_json::from_str(text)?;
    Ok(raw.into_iter().map(TableGrid::new).collect())
}

/// Splits one page of extracted text into grids.
///
/// Consecutive non-blank lines form a grid; each line becomes a row.
#[must_use]
pub fn grids_from_text(text: &str) -> Vec<TableGrid> {
    let mut grids = Vec::new();
    let mut rows: Vec<Row> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !rows.is_empty() {
                grids.push(TableGrid::new(std::mem::take(&mut rows)));
            }
            continue;
        }

        rows.push(split_cells(line));
    }

    if !rows.is_empty() {
        grids.push(TableGrid::new(rows));
    }

    grids
}

/// Splits a line into trimmed cells.
#[must_use]
pub fn split_cells(line: &str) -> Row {
    CELL_SEPARATOR_RE
        .split(line.trim())
        .map(|cell| cell.trim().to_owned())
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_separate_grids() {
        let text = "Device Information\nDevice Name: WS-01    Domain: CORP\n\n\nHardware\nProcessor: Intel i7\n";

        let grids = grids_from_text(text);

        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].rows[1], vec!["Device Name: WS-01", "Domain: CORP"]);
        assert_eq!(grids[1].first_cell(), Some("Hardware"));
    }

    #[test]
    fn single_spaces_and_pipes_stay_inside_cells() {
        assert_eq!(
            split_cells("  NVIDIA GeForce | Intel HD\t\t20 GB  "),
            vec!["NVIDIA GeForce | Intel HD", "20 GB"]
        );
    }

    #[test]
    fn json_grids_are_cleaned() {
        let grids =
            parse_json_grids(r#"[[["Device\nInformation "], [" Device Name: WS-01", ""]], []]"#)
                .unwrap();

        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].first_cell(), Some("DeviceInformation"));
        assert_eq!(grids[0].rows[1], vec!["Device Name: WS-01", ""]);
        assert!(grids[1].is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_json_grids(r#"{"not": "grids"}"#),
            Err(ReportError::Json(_))
        ));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = load_grids(Path::new("/tmp/report.docx"), &PdfGridOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::UnsupportedFileType { ref file_name } if file_name == "report.docx"
        ));
    }
}
