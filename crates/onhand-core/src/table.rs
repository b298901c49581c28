//! Core table types for decoded CSV uploads

use serde::{Deserialize, Serialize};

/// Text encoding an upload was decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    /// UTF-8, the primary attempt
    #[serde(rename = "utf-8")]
    Utf8,
    /// ISO-8859-1, used when the bytes are not valid UTF-8
    #[serde(rename = "latin-1")]
    Latin1,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A table decoded from one upload, or the concatenation of several
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions, in header order
    pub columns: Vec<Column>,
    /// Row data; every row has exactly one cell per column
    pub rows: Vec<Row>,
    /// Name of the upload (or merged output) this table came from
    pub source_name: String,
    /// Encoding the source bytes were decoded with
    pub encoding: TextEncoding,
}

impl Table {
    /// Create a new empty table
    pub fn new(source_name: impl Into<String>, encoding: TextEncoding) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            source_name: source_name.into(),
            encoding,
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// The first `n` rows, for previews
    pub fn head(&self, n: usize) -> &[Row] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Project the table onto `names`, in that order.
    ///
    /// Returns `None` if any name is not a column of this table. A name listed
    /// twice picks the second column with that name, and so on.
    pub fn select(&self, names: &[String]) -> Option<Table> {
        let indices: Vec<usize> = names
            .iter()
            .enumerate()
            .map(|(pos, name)| {
                let nth = names[..pos].iter().filter(|n| *n == name).count();
                self.columns
                    .iter()
                    .filter(|c| c.name == *name)
                    .nth(nth)
                    .map(|c| c.index)
            })
            .collect::<Option<_>>()?;

        let columns = names
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(name.clone(), i))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                Row::new(
                    indices
                        .iter()
                        .map(|&i| row.get(i).cloned().unwrap_or(CellValue::Empty))
                        .collect(),
                )
            })
            .collect();

        Some(Table {
            columns,
            rows,
            source_name: self.source_name.clone(),
            encoding: self.encoding,
        })
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name as it appears in the header
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// An opaque cell value.
///
/// Cells keep the exact decoded text; nothing is trimmed or converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Raw field text
    Text(String),
    /// Empty field, or a field missing from a short row
    Empty,
}

/// Display-only classification of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Integer,
    Float,
    Text,
    Empty,
}

impl CellValue {
    /// Wrap a raw field
    pub fn from_field(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Borrow the raw text (empty string for empty cells)
    pub fn as_str(&self) -> &str {
        match self {
            CellValue::Text(s) => s,
            CellValue::Empty => "",
        }
    }

    /// Guess what the cell looks like, for display alignment only
    pub fn kind(&self) -> CellKind {
        let trimmed = self.as_str().trim();

        if trimmed.is_empty() {
            return CellKind::Empty;
        }
        if trimmed.parse::<i64>().is_ok() {
            return CellKind::Integer;
        }
        if trimmed.parse::<f64>().is_ok() {
            return CellKind::Float;
        }
        CellKind::Text
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
