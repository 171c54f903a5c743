use thiserror::Error;

/// The raw content of a line that could not be read
#[derive(Debug)]
pub struct LineError {
    pub headers: Vec<String>,
    pub values: Vec<String>,
}

/// An error that can occur when building a GTFS snapshot.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not find file {0}")]
    MissingFile(String),
    #[error("The id {0} is not known")]
    ReferenceError(String),
    #[error("Could not read GTFS: {0} is neither a file nor a directory")]
    NotFileNorDirectory(String),
    #[error("not all stops for the date and the time window have been loaded")]
    StopTimesNotLoaded,
    #[error("'{0}' is not a valid time")]
    InvalidTime(String),
    #[error("'{0}' is not a valid date")]
    InvalidDate(String),
    #[error("'{0}' is not a valid color")]
    InvalidColor(String),
    #[error("missing column {0}")]
    MissingField(usize),
    #[error("'{value}' in column {column} is invalid: {reason}")]
    InvalidField {
        column: usize,
        value: String,
        reason: String,
    },
    #[error("impossible to read file")]
    IO(#[from] std::io::Error),
    #[error("impossible to read '{file_name}'")]
    NamedFileIO {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("impossible to read csv file '{file_name}'")]
    CSVError {
        file_name: String,
        #[source]
        source: csv::Error,
        line_in_error: Option<LineError>,
    },
    #[error("invalid row at line {line} of '{file_name}'")]
    InvalidRow {
        file_name: String,
        line: u64,
        #[source]
        source: Box<Error>,
        line_in_error: LineError,
    },
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl Error {
    /// The source could not be opened
    pub fn is_file_access(&self) -> bool {
        matches!(
            self,
            Error::MissingFile(_) | Error::NamedFileIO { .. } | Error::NotFileNorDirectory(_)
        )
    }

    /// An operation was called before the ones it depends on
    pub fn is_precondition(&self) -> bool {
        matches!(self, Error::StopTimesNotLoaded)
    }
}
