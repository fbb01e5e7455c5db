//! Progress reporting.
//!
//! Processing a large zone can take a while. To show that something is
//! happening, the statistics emit a mark for every 100,000 domains counted
//! and a heavier mark for every million. How these marks are shown is up to
//! an implementation of the [`Progress`] trait.

use std::io::{self, Write};
use tracing::debug;

//------------ Mark ----------------------------------------------------------

/// A progress mark.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mark {
    /// Another million domains.
    Major,

    /// Another 100,000 domains.
    Minor,
}

impl Mark {
    /// Returns the mark due when the domain count reaches `count`, if any.
    ///
    /// If both marks are due, only the major mark is returned.
    pub fn for_count(count: u64) -> Option<Self> {
        if count == 0 {
            None
        } else if count % 1_000_000 == 0 {
            Some(Mark::Major)
        } else if count % 100_000 == 0 {
            Some(Mark::Minor)
        } else {
            None
        }
    }

    /// Returns the character representing the mark.
    pub fn as_char(self) -> char {
        match self {
            Mark::Major => '*',
            Mark::Minor => '.',
        }
    }
}

//------------ Progress ------------------------------------------------------

/// A receiver of progress marks.
pub trait Progress {
    /// Shows a mark.
    fn mark(&mut self, mark: Mark);
}

impl<P: Progress + ?Sized> Progress for &mut P {
    fn mark(&mut self, mark: Mark) {
        (**self).mark(mark)
    }
}

/// Collects the marks, mostly for testing.
impl Progress for Vec<Mark> {
    fn mark(&mut self, mark: Mark) {
        self.push(mark)
    }
}

//------------ NoProgress ----------------------------------------------------

/// Progress that goes nowhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn mark(&mut self, _mark: Mark) {}
}

//------------ WriterProgress ------------------------------------------------

/// Progress written as characters to a writer.
///
/// Each mark is flushed right away. If writing fails, the error is logged
/// and all further marks are dropped.
#[derive(Debug)]
pub struct WriterProgress<W> {
    target: W,
    failed: bool,
}

impl<W: Write> WriterProgress<W> {
    /// Creates progress written to `target`.
    pub fn new(target: W) -> Self {
        WriterProgress {
            target,
            failed: false,
        }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.target
    }

    fn write_mark(&mut self, mark: Mark) -> Result<(), io::Error> {
        let mut buf = [0; 4];
        self.target
            .write_all(mark.as_char().encode_utf8(&mut buf).as_bytes())?;
        self.target.flush()
    }
}

impl WriterProgress<io::Stderr> {
    /// Creates progress written to stderr.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> Progress for WriterProgress<W> {
    fn mark(&mut self, mark: Mark) {
        if self.failed {
            return;
        }
        if let Err(err) = self.write_mark(mark) {
            debug!("failed to write progress: {}", err);
            self.failed = true;
        }
    }
}

//============ Tests =========================================================
