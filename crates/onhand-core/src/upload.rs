//! Upload intake: buffering CSV files and collecting them from disk

use crate::error::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A named CSV upload with its content buffered in memory.
///
/// The bytes are read once, so the same upload can be decoded for more than
/// one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

impl UploadedFile {
    /// Create an upload from a name and its raw content
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, naming the upload after its file name
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { name, bytes })
    }

    /// The upload's filename
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The upload's raw content
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Result of collecting uploads from the filesystem
#[derive(Debug, Clone, Default)]
pub struct UploadSet {
    /// Accepted CSV uploads, in the order they were given
    pub files: Vec<UploadedFile>,
    /// Paths given explicitly that are not CSV files
    pub rejected: Vec<RejectedPath>,
}

/// A path that was not accepted as an upload
#[derive(Debug, Clone, Serialize)]
pub struct RejectedPath {
    pub path: PathBuf,
    pub reason: String,
}

/// Check whether a path has a `.csv` extension (case-insensitive)
pub fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Collect CSV uploads from a list of files and directories.
///
/// Files are taken in the order given. Directories are walked recursively and
/// their CSV files added in sorted path order; non-CSV files inside a
/// directory are skipped without being reported.
pub fn collect_uploads<P: AsRef<Path>>(paths: &[P]) -> Result<UploadSet> {
    let mut set = UploadSet::default();

    for path in paths {
        let path = path.as_ref();

        if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && is_csv_path(entry.path()) {
                    set.files.push(UploadedFile::from_path(entry.path())?);
                }
            }
        } else if is_csv_path(path) {
            set.files.push(UploadedFile::from_path(path)?);
        } else {
            tracing::warn!(path = %path.display(), "skipping non-CSV path");
            set.rejected.push(RejectedPath {
                path: path.to_path_buf(),
                reason: "not a .csv file".to_string(),
            });
        }
    }

    tracing::debug!(
        accepted = set.files.len(),
        rejected = set.rejected.len(),
        "collected uploads"
    );

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_csv_path() {
        assert!(is_csv_path(Path::new("location_a.csv")));
        assert!(is_csv_path(Path::new("DC_MAIN.CSV")));
        assert!(!is_csv_path(Path::new("notes.txt")));
        assert!(!is_csv_path(Path::new("csv")));
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("location_A.csv");
        fs::write(&path, "id,qty\n1,2\n").unwrap();

        let upload = UploadedFile::from_path(&path).unwrap();
        assert_eq!(upload.name(), "location_A.csv");
        assert_eq!(upload.bytes(), b"id,qty\n1,2\n");
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = UploadedFile::from_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_collect_uploads_walks_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b_location.csv"), "id\n1\n").unwrap();
        fs::write(dir.path().join("a_dc.csv"), "id\n2\n").unwrap();
        fs::write(dir.path().join("readme.txt"), "ignore me").unwrap();
        fs::write(dir.path().join("nested").join("c_dc.CSV"), "id\n3\n").unwrap();

        let set = collect_uploads(&[dir.path()]).unwrap();
        let names: Vec<&str> = set.files.iter().map(|f| f.name()).collect();

        assert_eq!(names, vec!["a_dc.csv", "b_location.csv", "c_dc.CSV"]);
        assert!(set.rejected.is_empty());
    }

    #[test]
    fn test_collect_uploads_rejects_explicit_non_csv() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("location.csv");
        let txt = dir.path().join("location.txt");
        fs::write(&csv, "id\n1\n").unwrap();
        fs::write(&txt, "id\n1\n").unwrap();

        let set = collect_uploads(&[&txt, &csv]).unwrap();

        assert_eq!(set.files.len(), 1);
        assert_eq!(set.files[0].name(), "location.csv");
        assert_eq!(set.rejected.len(), 1);
        assert_eq!(set.rejected[0].path, txt);
    }
}
