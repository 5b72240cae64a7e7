//! Custom error types for the dbf-reader crate.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum DbfError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The requested table file could not be resolved on disk.
    #[error("No such file: {}", .0.display())]
    MissingFile(PathBuf),

    /// A memo field is declared but no companion memo file exists next to the table.
    #[error("Missing memo file for table {}", .0.display())]
    MissingMemoFile(PathBuf),

    /// The field descriptor section ended before any field was read.
    #[error("DBF file must have at least one field: {}", .0.display())]
    EmptySchema(PathBuf),

    /// A field violates the fixed length required by its type.
    #[error("Field {field:?} of type {type_code:?} must have length {expected} (was {found})")]
    InvalidFieldLength {
        field: String,
        type_code: char,
        expected: u8,
        found: u8,
    },

    /// The field decoder does not know how to read this type code.
    #[error("Unknown field type {type_code:?} for field {field:?}")]
    UnsupportedFieldType { field: String, type_code: char },

    /// The header's record length disagrees with the sum of the field lengths.
    #[error("Record length mismatch: header declares {declared} bytes, fields need {computed} bytes")]
    RecordLengthMismatch { declared: u16, computed: usize },

    /// A record marker byte is neither active, deleted nor the end sentinel.
    #[error("Invalid record separator {byte:#04x} at offset {offset}")]
    InvalidRecordSeparator { byte: u8, offset: u64 },

    /// A field's bytes could not be interpreted as its declared type.
    #[error("Invalid value for field {field:?} of type {type_code:?}: {reason}")]
    InvalidFieldValue {
        field: String,
        type_code: char,
        reason: String,
    },

    /// A memo pointer does not name a block inside the memo file.
    #[error("Memo block {0} not found")]
    MemoNotFound(u64),

    /// The memo file header is structurally invalid.
    #[error("Invalid memo file: {0}")]
    InvalidMemoFile(String),

    /// A mutex lock was poisoned, indicating a panic in another thread holding the lock.
    #[error("A mutex lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

impl DbfError {
    /// True for errors raised because a required file is absent.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, DbfError::MissingFile(_) | DbfError::MissingMemoFile(_))
    }

    /// True for schema violations detected before any record is read.
    pub fn is_malformed_schema(&self) -> bool {
        matches!(
            self,
            DbfError::EmptySchema(_)
                | DbfError::InvalidFieldLength { .. }
                | DbfError::UnsupportedFieldType { .. }
                | DbfError::RecordLengthMismatch { .. }
        )
    }

    /// True when a traversal hit a byte that cannot start a record.
    pub fn is_corrupt_stream(&self) -> bool {
        matches!(self, DbfError::InvalidRecordSeparator { .. })
    }
}

/// A convenience `Result` type alias using the crate's `DbfError` type.
pub type Result<T> = std::result::Result<T, DbfError>;
