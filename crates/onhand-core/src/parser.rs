//! Decoding uploads into tables
//!
//! Bytes are decoded as UTF-8 first. If they are not valid UTF-8 the upload is
//! decoded again as ISO-8859-1, where every byte maps to a character.

use crate::error::{Error, Result};
use crate::table::{CellValue, Column, Row, Table, TextEncoding};
use crate::upload::UploadedFile;
use std::borrow::Cow;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode an upload into a Table
pub fn decode_table(file: &UploadedFile) -> Result<Table> {
    let (text, encoding) = decode_text(file.bytes());
    if encoding == TextEncoding::Latin1 {
        tracing::info!(file = file.name(), "not valid UTF-8, decoded as latin-1");
    }
    parse_text(&text, file.name(), encoding)
}

/// Parse a CSV file on disk into a Table
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let upload = UploadedFile::from_path(path)?;
    decode_table(&upload)
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    parse_text(content, source_name, TextEncoding::Utf8)
}

/// Turn raw bytes into text, falling back to latin-1 on invalid UTF-8
fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, TextEncoding) {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(body) {
        Some(text) => (text, TextEncoding::Utf8),
        None => (
            encoding_rs::mem::decode_latin1(body),
            TextEncoding::Latin1,
        ),
    }
}

fn parse_text(content: &str, source_name: &str, encoding: TextEncoding) -> Result<Table> {
    let decode_error = |message: String| Error::Decode {
        file_name: source_name.to_string(),
        message,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // short rows are padded below
        .from_reader(content.as_bytes());

    // Parse headers into columns
    let headers = csv_reader
        .headers()
        .map_err(|e| decode_error(e.to_string()))?;

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(name.to_string(), i))
        .collect();

    if columns.is_empty() {
        return Err(decode_error("no columns found in CSV".to_string()));
    }

    // Parse rows
    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| decode_error(e.to_string()))?;

        if record.len() > columns.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(decode_error(format!(
                "line {} has {} fields, header has {}",
                line,
                record.len(),
                columns.len()
            )));
        }

        let mut cells: Vec<CellValue> = record.iter().map(CellValue::from_field).collect();

        // Pad with empty cells if row is shorter than header
        cells.resize(columns.len(), CellValue::Empty);

        rows.push(Row::new(cells));
    }

    Ok(Table {
        columns,
        rows,
        source_name: source_name.to_string(),
        encoding,
    })
}
