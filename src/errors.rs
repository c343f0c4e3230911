use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to open or query the network schema.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("schema file {} does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error("could not open schema: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("schema query failed: {0}")]
    Query(#[from] diesel::result::Error),
}

/// Errors from reading a DWF factor file or a lateral table.
///
/// Line numbers are 1-based and refer to the record that failed to parse.
#[derive(Error, Debug)]
pub enum MalformedInputError {
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("input is not valid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {reason}")]
    Row { line: u64, reason: String },
}

impl MalformedInputError {
    pub fn row(line: u64, reason: impl Into<String>) -> Self {
        MalformedInputError::Row {
            line,
            reason: reason.into(),
        }
    }
}

/// An hour bucket is missing from the diurnal factor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactorLookupError {
    pub hour: u32,
}

impl fmt::Display for FactorLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no DWF factor for hour {}", self.hour)
    }
}

impl std::error::Error for FactorLookupError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindowError(String);

impl TimeWindowError {
    pub fn new(msg: &str) -> Self {
        TimeWindowError(msg.to_owned())
    }
}

impl fmt::Display for TimeWindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TimeWindowError {}

/// The lateral table could not be written.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("could not write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OutputError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        OutputError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Everything a single DWF run can fail with.
#[derive(Error, Debug)]
pub enum DwfError {
    #[error("data source error: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("malformed input: {0}")]
    MalformedInput(#[from] MalformedInputError),

    #[error("factor lookup error: {0}")]
    FactorLookup(#[from] FactorLookupError),

    #[error("invalid time window: {0}")]
    TimeWindow(#[from] TimeWindowError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}
