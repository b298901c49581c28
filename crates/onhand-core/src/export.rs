//! Writing merged tables back out as UTF-8 CSV
//!
//! Output has a header row, no index column, minimal quoting and `\n` line
//! endings.

use crate::error::{Error, Result};
use crate::merger::MergedTable;
use crate::table::Table;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer)
}

/// Serialize a table as CSV into `writer`
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let serialize_error = |e: csv::Error| Error::Serialize {
        table: table.source_name.clone(),
        source: e,
    };
    let mut writer = csv_writer(writer);

    writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .map_err(serialize_error)?;
    for row in &table.rows {
        writer
            .write_record(row.cells.iter().map(|c| c.as_str()))
            .map_err(serialize_error)?;
    }

    writer.flush().map_err(|e| serialize_error(e.into()))?;
    Ok(())
}

/// Serialize a table as CSV bytes
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    Ok(buf)
}

/// Write a merged group to `<output_dir>/<file_name>`, returning the path
pub fn write_merged<P: AsRef<Path>>(
    merged: &MergedTable,
    output_dir: P,
    file_name: &str,
) -> Result<PathBuf> {
    let mut paths = write_all_merged(&[(merged, file_name)], output_dir)?;
    Ok(paths.remove(0))
}

/// Write several merged groups, all or nothing.
///
/// Every table is serialized before any file is created. If a write fails,
/// the files already written by this call are removed again.
pub fn write_all_merged<P: AsRef<Path>>(
    outputs: &[(&MergedTable, &str)],
    output_dir: P,
) -> Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();

    let encoded = outputs
        .iter()
        .map(|(merged, file_name)| -> Result<(PathBuf, Vec<u8>)> {
            Ok((output_dir.join(file_name), to_csv_bytes(&merged.table)?))
        })
        .collect::<Result<Vec<_>>>()?;

    if encoded.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(output_dir).map_err(|e| Error::FileWrite {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let mut written: Vec<PathBuf> = Vec::with_capacity(encoded.len());
    for (path, bytes) in encoded {
        if let Err(e) = fs::write(&path, &bytes) {
            for done in &written {
                if let Err(cleanup) = fs::remove_file(done) {
                    tracing::warn!(
                        path = %done.display(),
                        error = %cleanup,
                        "could not remove partial output"
                    );
                }
            }
            return Err(Error::FileWrite { path, source: e });
        }

        tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote merged table");
        written.push(path);
    }

    Ok(written)
}
