use std::fmt;
use std::path::PathBuf;

use th_calendar::CalendarError;

/// Errors produced while loading a calendar export.
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem error outside the CSV reader.
    Io(String),
    /// A required table is not in the export directory.
    MissingFile(PathBuf),
    /// Structural CSV error (bad quoting, ragged row, undecodable header).
    Csv { file: String, message: String },
    /// A cell could not be parsed into its domain type.
    ParseField {
        file: String,
        row: usize,
        field: &'static str,
        raw: String,
    },
    /// Rows parsed but the snapshot failed validation.
    Snapshot(CalendarError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "store io error: {msg}"),
            StoreError::MissingFile(path) => {
                write!(f, "required table missing: {}", path.display())
            }
            StoreError::Csv { file, message } => write!(f, "{file}: {message}"),
            StoreError::ParseField {
                file,
                row,
                field,
                raw,
            } => write!(
                f,
                "{file} row {row}: cannot parse field '{field}' from value '{raw}'"
            ),
            StoreError::Snapshot(e) => write!(f, "snapshot rejected: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Snapshot(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CalendarError> for StoreError {
    fn from(e: CalendarError) -> Self {
        StoreError::Snapshot(e)
    }
}
