use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    NotFound,
    InvalidArgument,
    Internal,
    InvalidInput,
    InvalidState,
    Validation,  // Required field missing on insert
    EmptyData,   // Single-record lookup matched nothing
    Schema,      // Live column lookup failed or table missing
    Execution,   // Store rejected the statement
    Decode,      // Row could not be mapped to a record
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn empty_data() -> Self {
        Error::new(ErrorKind::EmptyData, "EmptyData".to_string())
    }

    pub fn is_empty_data(&self) -> bool {
        self.kind == ErrorKind::EmptyData
    }

    /// Prefix the context with `msg`, keeping the kind.
    pub fn wrap(self, msg: &str) -> Self {
        Error {
            kind: self.kind,
            context: format!("{}: {}", msg, self.context),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error {
            kind: ErrorKind::Execution,
            context: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: format!("failed to persist file: {}", err.error),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach a human readable prefix to any error convertible into [`Error`].
pub trait Context<T> {
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> Context<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| e.into().wrap(msg))
    }
}
