//! Errors reported while reading a zonefile.

use super::entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{error, fmt, io};

//------------ ParseError ----------------------------------------------------

/// A position in a zonefile could not be turned into a record.
///
/// These errors are not fatal: the reader continues with the next entry.
#[derive(Debug)]
pub struct ParseError {
    /// The file the problem was found in.
    file: Arc<Path>,

    /// The line the offending entry started on.
    line: usize,

    /// What went wrong.
    kind: ParseErrorKind,
}

impl ParseError {
    pub(super) fn new(
        file: Arc<Path>,
        line: usize,
        kind: ParseErrorKind,
    ) -> Self {
        ParseError { file, line, kind }
    }

    /// Returns the path of the file the error was found in.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Returns the line number of the offending entry.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns what went wrong.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.kind)
    }
}

impl error::Error for ParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.kind {
            ParseErrorKind::Include { ref err, .. } => Some(err),
            ParseErrorKind::Read(ref err) => Some(err),
            _ => None,
        }
    }
}

//------------ ParseErrorKind ------------------------------------------------

/// The different things that can go wrong with an entry.
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// The record scanner rejected the entry.
    Record(String),

    /// The entry is longer than the reader is willing to keep in memory.
    EntryTooLong,

    /// The entry closes a parenthesis that was never opened.
    Unbalanced,

    /// An indented record appeared before any record with an owner.
    MissingOwner,

    /// A relative name was used but no origin is known.
    MissingOrigin,

    /// The name given to `$ORIGIN` or `$INCLUDE` is invalid.
    BadOrigin(String),

    /// The value given to `$TTL` is not a number of seconds.
    BadTtl,

    /// A control directive is missing its argument.
    MissingArgument(&'static str),

    /// A control directive this reader doesn’t know.
    UnknownControl(String),

    /// Includes have been disabled.
    IncludeDisabled,

    /// Includes are nested too deeply.
    IncludeDepth,

    /// An included file could not be opened.
    Include { path: PathBuf, err: io::Error },

    /// Reading the data failed.
    ///
    /// This ends the file in question.
    Read(io::Error),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseErrorKind::Record(ref err) => f.write_str(err),
            ParseErrorKind::EntryTooLong => {
                write!(f, "entry exceeds {} bytes", entry::MAX_ENTRY_LEN)
            }
            ParseErrorKind::Unbalanced => {
                f.write_str("unbalanced parentheses")
            }
            ParseErrorKind::MissingOwner => {
                f.write_str("record without owner")
            }
            ParseErrorKind::MissingOrigin => {
                f.write_str("relative name without origin")
            }
            ParseErrorKind::BadOrigin(ref err) => {
                write!(f, "invalid origin: {}", err)
            }
            ParseErrorKind::BadTtl => f.write_str("invalid $TTL value"),
            ParseErrorKind::MissingArgument(ctrl) => {
                write!(f, "{} without argument", ctrl)
            }
            ParseErrorKind::UnknownControl(ref ctrl) => {
                write!(f, "unsupported control entry '{}'", ctrl)
            }
            ParseErrorKind::IncludeDisabled => {
                f.write_str("$INCLUDE is disabled")
            }
            ParseErrorKind::IncludeDepth => {
                f.write_str("$INCLUDE nested too deeply")
            }
            ParseErrorKind::Include { ref path, ref err } => {
                write!(f, "cannot include {}: {}", path.display(), err)
            }
            ParseErrorKind::Read(ref err) => write!(f, "read error: {}", err),
        }
    }
}
