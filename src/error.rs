//! Errors that end a run.
//!
//! Problems with individual entries of a zonefile are not fatal. They are
//! reported through [`ParseError`][crate::source::ParseError] and counted.
//! The errors here stop processing altogether.

use std::path::PathBuf;
use std::{error, fmt, io};

//------------ Error ---------------------------------------------------------

#[derive(Debug)]
pub enum Error {
    /// The zonefile could not be opened.
    Open { path: PathBuf, err: io::Error },

    /// Writing the report failed.
    Output(io::Error),

    /// Writing the CSV summary failed.
    Csv(csv::Error),

    /// Writing the JSON report failed.
    Json(serde_json::Error),
}

impl Error {
    pub fn open(path: impl Into<PathBuf>, err: io::Error) -> Self {
        Error::Open {
            path: path.into(),
            err,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "cannot open '{}': {}", path.display(), err)
            }
            Error::Output(err) => write!(f, "cannot write report: {}", err),
            Error::Csv(err) => write!(f, "cannot write CSV: {}", err),
            Error::Json(err) => write!(f, "cannot write JSON: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Open { err, .. } => Some(err),
            Error::Output(err) => Some(err),
            Error::Csv(err) => Some(err),
            Error::Json(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Output(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

//============ Tests =========================================================
