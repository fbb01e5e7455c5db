//! Splitting zonefile data into entries.
//!
//! An entry is what a zonefile scanner processes in one go: a record or a
//! control directive. It normally spans a single line but may continue over
//! several lines if parts of it are enclosed in parentheses. This module
//! only finds the boundaries of entries; it doesn’t interpret them beyond
//! providing a [`Tokens`] iterator for looking at their first few words.

use std::io::{self, BufRead, Read};

//------------ Constants -----------------------------------------------------

/// The size at which an entry is cut off.
///
/// This applies to single lines as well as entries spanning several lines
/// through unclosed parentheses.
pub const MAX_ENTRY_LEN: usize = 1024 * 1024;

//------------ EntryReader ---------------------------------------------------

/// A reader producing the raw entries of a zonefile.
#[derive(Debug)]
pub struct EntryReader<R> {
    /// The underlying reader.
    read: R,

    /// The number of lines read so far.
    line_num: usize,
}

impl<R: BufRead> EntryReader<R> {
    /// Creates a new entry reader atop a buffered reader.
    pub fn new(read: R) -> Self {
        EntryReader { read, line_num: 0 }
    }

    /// Reads the next entry into `buf`.
    ///
    /// Any previous content of `buf` is discarded. Empty lines and lines
    /// containing only comments are skipped. Returns the line number the
    /// entry started on or `Ok(None)` if the end of the data was reached.
    ///
    /// The entry is returned including its final line feed, if there was
    /// one, and with comments left in place.
    ///
    /// An entry that is too long or has unbalanced parentheses is dropped
    /// and returned as an error. Reading can continue after these. After
    /// [`EntryError::Read`], the state of the underlying reader is unknown.
    pub fn next_entry(
        &mut self,
        buf: &mut Vec<u8>,
    ) -> Result<Option<usize>, EntryError> {
        buf.clear();
        let mut state = LineState::default();
        let mut start = 0;
        loop {
            let line_start = buf.len();
            let line = self.line_num + 1;
            let limit = (MAX_ENTRY_LEN + 1 - line_start) as u64;
            let read = (&mut self.read)
                .take(limit)
                .read_until(b'\n', buf)
                .map_err(|err| EntryError::Read { line, err })?;
            if read == 0 {
                // End of data. Whatever we have left is an entry if there
                // is something meaningful in it.
                if state.unbalanced {
                    buf.clear();
                    return Err(EntryError::Unbalanced { line: start });
                }
                return Ok(if state.significant { Some(start) } else { None });
            }
            self.line_num = line;
            if line_start == 0 {
                start = line;
            }

            if buf.len() > MAX_ENTRY_LEN {
                if buf.last() != Some(&b'\n') {
                    self.skip_line()
                        .map_err(|err| EntryError::Read { line, err })?;
                }
                buf.clear();
                return Err(EntryError::TooLong { line: start });
            }

            state.scan_line(&buf[line_start..]);
            if state.parens == 0 {
                if state.unbalanced {
                    buf.clear();
                    return Err(EntryError::Unbalanced { line: start });
                }
                if state.significant {
                    return Ok(Some(start));
                }
                buf.clear();
            }
        }
    }

    /// Drops the remainder of the current line.
    fn skip_line(&mut self) -> Result<(), io::Error> {
        loop {
            let (used, done) = {
                let data = self.read.fill_buf()?;
                if data.is_empty() {
                    return Ok(());
                }
                match data.iter().position(|&ch| ch == b'\n') {
                    Some(pos) => (pos + 1, true),
                    None => (data.len(), false),
                }
            };
            self.read.consume(used);
            if done {
                return Ok(());
            }
        }
    }
}

//------------ EntryError ----------------------------------------------------

/// An entry could not be read.
#[derive(Debug)]
pub enum EntryError {
    /// Reading failed while on the given line.
    Read { line: usize, err: io::Error },

    /// The entry starting on the given line exceeds [`MAX_ENTRY_LEN`].
    TooLong { line: usize },

    /// The entry starting on the given line closes a parenthesis that was
    /// never opened.
    Unbalanced { line: usize },
}

//------------ LineState -----------------------------------------------------

/// The scanning state carried from one line of an entry to the next.
#[derive(Clone, Copy, Debug, Default)]
struct LineState {
    /// The number of currently open parentheses.
    parens: usize,

    /// Have we seen anything other than white space and comments?
    significant: bool,

    /// Has a closing parenthesis appeared without an opening one?
    unbalanced: bool,
}

impl LineState {
    /// Updates the state with the content of a single line.
    ///
    /// Quoted strings end at the end of a line.
    fn scan_line(&mut self, line: &[u8]) {
        let mut quoted = false;
        let mut escaped = false;
        for &ch in line {
            if escaped {
                escaped = false;
                self.significant = true;
                continue;
            }
            match ch {
                b'\\' => {
                    escaped = true;
                    self.significant = true;
                }
                b'"' => {
                    quoted = !quoted;
                    self.significant = true;
                }
                _ if quoted => {}
                b';' => break,
                b'(' => self.parens += 1,
                b')' => match self.parens.checked_sub(1) {
                    Some(parens) => self.parens = parens,
                    None => self.unbalanced = true,
                },
                b' ' | b'\t' | b'\r' | b'\n' => {}
                _ => self.significant = true,
            }
        }
    }
}

//------------ Tokens --------------------------------------------------------

/// An iterator over the tokens of an entry.
///
/// Each item is the token’s content, without the surrounding quotes for
/// quoted tokens, and the index in the entry just past the token. Escape
/// sequences are left untouched. Parentheses and comments are skipped.
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
    entry: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(entry: &'a [u8]) -> Self {
        Tokens { entry, pos: 0 }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = (&'a [u8], usize);

    fn next(&mut self) -> Option<Self::Item> {
        // Skip separators and comments.
        loop {
            match *self.entry.get(self.pos)? {
                b' ' | b'\t' | b'\r' | b'\n' | b'(' | b')' => self.pos += 1,
                b';' => {
                    while self
                        .entry
                        .get(self.pos)
                        .is_some_and(|ch| *ch != b'\n')
                    {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }

        if self.entry[self.pos] == b'"' {
            let start = self.pos + 1;
            let mut end = start;
            let mut escaped = false;
            while let Some(&ch) = self.entry.get(end) {
                if escaped {
                    escaped = false;
                } else if ch == b'\\' {
                    escaped = true;
                } else if ch == b'"' || ch == b'\n' {
                    break;
                }
                end += 1;
            }
            // Step over the closing quote if there is one.
            self.pos = if self.entry.get(end) == Some(&b'"') {
                end + 1
            } else {
                end
            };
            Some((&self.entry[start..end], self.pos))
        } else {
            let start = self.pos;
            let mut escaped = false;
            while let Some(&ch) = self.entry.get(self.pos) {
                if escaped {
                    escaped = false;
                } else if ch == b'\\' {
                    escaped = true;
                } else if matches!(
                    ch,
                    b' ' | b'\t' | b'\r' | b'\n' | b'(' | b')' | b';' | b'"'
                ) {
                    break;
                }
                self.pos += 1;
            }
            Some((&self.entry[start..self.pos], self.pos))
        }
    }
}

//============ Tests =========================================================
