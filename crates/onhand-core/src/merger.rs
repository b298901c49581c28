//! Merge engine for concatenating a group of uploads with a shared header

use crate::error::{Error, Result};
use crate::parser::decode_table;
use crate::table::{Table, TextEncoding};
use crate::upload::UploadedFile;
use serde::{Deserialize, Serialize};

/// A group's uploads concatenated into one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedTable {
    /// Group label (e.g. "Location On Hand")
    pub label: String,
    /// Concatenated rows, columns in canonical order
    pub table: Table,
    /// Header shared by every file in the group
    pub columns: Vec<String>,
    /// Files that contributed to this table, in merge order
    pub sources: Vec<SourceSummary>,
}

impl MergedTable {
    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// Files that were decoded with the latin-1 fallback
    pub fn fallback_sources(&self) -> impl Iterator<Item = &SourceSummary> {
        self.sources
            .iter()
            .filter(|s| s.encoding == TextEncoding::Latin1)
    }
}

/// One contributing file of a merged table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub name: String,
    pub rows: usize,
    pub encoding: TextEncoding,
}

/// Merge a group of uploads into a single table.
///
/// Files are decoded and checked one at a time. The first file's header is
/// canonical; every later file must have exactly the same column names in the
/// same order. The first mismatch aborts the merge and later files are never
/// decoded. An empty group yields `Ok(None)`.
pub fn merge_group(files: &[&UploadedFile], label: &str) -> Result<Option<MergedTable>> {
    let mut canonical: Option<Vec<String>> = None;
    let mut tables: Vec<Table> = Vec::with_capacity(files.len());

    for file in files {
        tracing::debug!(group = label, file = file.name(), "decoding");
        let table = decode_table(file)?;
        let columns = table.column_names();

        match &canonical {
            None => canonical = Some(columns),
            Some(expected) if *expected != columns => {
                tracing::warn!(group = label, file = file.name(), "column mismatch");
                return Err(Error::SchemaMismatch {
                    file_name: file.name().to_string(),
                    group_label: label.to_string(),
                    expected_columns: expected.clone(),
                    actual_columns: columns,
                });
            }
            Some(_) => {}
        }

        tables.push(table);
    }

    let Some(columns) = canonical else {
        return Ok(None);
    };

    let merged = merge_tables(label, &columns, tables)?;
    tracing::info!(
        group = label,
        files = merged.sources.len(),
        rows = merged.row_count(),
        "merged group"
    );

    Ok(Some(merged))
}

/// Concatenate already validated tables and project onto `columns`
fn merge_tables(label: &str, columns: &[String], tables: Vec<Table>) -> Result<MergedTable> {
    let mut sources = Vec::with_capacity(tables.len());
    let mut combined = Table::new(label, TextEncoding::Utf8);

    for table in tables {
        // Header equality is already checked, but select by name so the
        // output order never depends on that.
        let projected = table.select(columns).ok_or_else(|| Error::SchemaMismatch {
            file_name: table.source_name.clone(),
            group_label: label.to_string(),
            expected_columns: columns.to_vec(),
            actual_columns: table.column_names(),
        })?;

        sources.push(SourceSummary {
            name: table.source_name,
            rows: projected.row_count(),
            encoding: table.encoding,
        });

        if combined.columns.is_empty() {
            combined.columns = projected.columns;
        }
        combined.rows.extend(projected.rows);
    }

    Ok(MergedTable {
        label: label.to_string(),
        table: combined,
        columns: columns.to_vec(),
        sources,
    })
}
