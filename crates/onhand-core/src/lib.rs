//! onhand-core: Core library for merging on-hand inventory CSV exports
//!
//! This library provides functionality to:
//! - Buffer CSV uploads from memory or disk
//! - Decode uploads into tables (UTF-8, falling back to latin-1)
//! - Split uploads into "Location" and "DC" groups by filename
//! - Concatenate each group, failing on the first file whose header differs
//! - Write merged tables back out as UTF-8 CSV

pub mod batch;
pub mod classifier;
pub mod error;
pub mod export;
pub mod merger;
pub mod parser;
pub mod table;
pub mod upload;

pub use batch::{merge_batch, BatchReport, GroupOutcome, HaltPolicy};
pub use classifier::{classify, Classification, GroupKind};
pub use error::{Error, Result};
pub use export::{to_csv_bytes, write_all_merged, write_csv, write_merged};
pub use merger::{merge_group, MergedTable, SourceSummary};
pub use parser::{decode_table, parse_csv, parse_csv_str};
pub use table::{CellKind, CellValue, Column, Row, Table, TextEncoding};
pub use upload::{collect_uploads, RejectedPath, UploadSet, UploadedFile};
