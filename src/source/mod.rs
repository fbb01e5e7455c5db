//! Reading records from zonefiles.
//!
//! The [`Reader`] in this module is the record source for the statistics.
//! It reads a zonefile sequentially, one entry at a time, and hands each
//! record entry to the zonefile scanner of the _domain_ crate. Only the
//! current entry is kept in memory, so zonefiles of any size can be
//! processed.
//!
//! Since each entry is scanned on its own, the reader itself keeps track of
//! everything that carries over from one entry to the next: the origin set
//! via `$ORIGIN`, the default TTL set via `$TTL`, and the owner, class, and
//! TTL of the previous record. It also follows `$INCLUDE` directives.
//!
//! Entries that cannot be scanned are returned as [`ParseError`]s. The
//! reader then carries on with the next entry.

pub use self::error::{ParseError, ParseErrorKind};

mod control;
mod entry;
mod error;

use self::control::{scan_name, Control};
use self::entry::{EntryError, EntryReader, Tokens};
use crate::record::{fmt_absolute, ScannedRr, StoredRecord};
use bytes::Bytes;
use domain::base::iana::{Class, Rtype};
use domain::base::name::FlattenInto;
use domain::base::{Name, Ttl};
use domain::zonefile::inplace::{self, Entry, Zonefile};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::{self, FromStr};
use std::sync::Arc;
use tracing::debug;

//------------ Constants -----------------------------------------------------

/// The TTL used if a record has none and no default has been set.
const DEFAULT_TTL: u32 = 3600;

/// The maximum number of nested `$INCLUDE`s.
const MAX_INCLUDE_DEPTH: usize = 7;

//------------ Reader --------------------------------------------------------

/// A reader producing the records of a zonefile.
///
/// The reader is an iterator over the records of the zonefile in the order
/// they appear in the file, with the records of included files appearing
/// in place of the `$INCLUDE` directive. Each item is either a record or a
/// [`ParseError`] for an entry that could not be read.
pub struct Reader<R> {
    /// The zonefile we have been created for.
    main: Source<R>,

    /// The currently open included files, innermost last.
    includes: Vec<Include>,

    /// The current origin.
    origin: Option<Name<Bytes>>,

    /// The TTL set via `$TTL`.
    default_ttl: Option<Ttl>,

    /// The owner of the last record as it should be written out.
    last_owner: Option<Vec<u8>>,

    /// The class of the last record.
    last_class: Class,

    /// The TTL of the last record.
    last_ttl: Option<Ttl>,

    /// Should `$INCLUDE` directives be followed?
    follow_includes: bool,

    /// Has the main zonefile run out?
    done: bool,

    /// The buffer for the raw entry.
    entry: Vec<u8>,

    /// The buffer for the entry as handed to the scanner.
    scan_buf: Vec<u8>,
}

impl Reader<BufReader<File>> {
    /// Opens the zonefile at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let path = path.as_ref();
        File::open(path).map(|file| Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> Reader<R> {
    /// Creates a reader for zonefile data.
    ///
    /// The `path` is used in error messages and to find included files
    /// with a relative path.
    pub fn new(read: R, path: impl Into<PathBuf>) -> Self {
        Reader {
            main: Source::new(read, path.into()),
            includes: Vec::new(),
            origin: None,
            default_ttl: None,
            last_owner: None,
            last_class: Class::IN,
            last_ttl: None,
            follow_includes: true,
            done: false,
            entry: Vec::new(),
            scan_buf: Vec::new(),
        }
    }

    /// Sets the initial origin.
    ///
    /// The origin is appended to relative names. It can be changed by the
    /// zonefile itself via `$ORIGIN`.
    pub fn set_origin(&mut self, origin: Name<Bytes>) {
        self.origin = Some(origin)
    }

    /// Sets whether `$INCLUDE` directives should be followed.
    ///
    /// If disabled, the directives result in an error. They are followed
    /// by default.
    pub fn set_follow_includes(&mut self, follow: bool) {
        self.follow_includes = follow
    }

    /// Returns the current origin.
    pub fn origin(&self) -> Option<&Name<Bytes>> {
        self.origin.as_ref()
    }

    /// Returns the next record.
    ///
    /// Returns `None` once the end of the zonefile has been reached.
    pub fn next_record(&mut self) -> Option<Result<ScannedRr, ParseError>> {
        loop {
            if self.done {
                return None;
            }
            let (file, line) = match self.next_entry() {
                Ok(Some(pos)) => pos,
                Ok(None) => {
                    if !self.end_include() {
                        self.done = true;
                    }
                    continue;
                }
                Err(err) => {
                    // After a read error, the file is broken. Give up on it.
                    if matches!(err.kind(), ParseErrorKind::Read(_))
                        && !self.end_include()
                    {
                        self.done = true;
                    }
                    return Some(Err(err));
                }
            };
            if self.entry.first() == Some(&b'$') {
                match self.process_control(&file) {
                    Ok(()) => continue,
                    Err(kind) => {
                        return Some(Err(ParseError::new(file, line, kind)))
                    }
                }
            }
            return Some(
                self.scan_record()
                    .map_err(|kind| ParseError::new(file, line, kind)),
            );
        }
    }

    /// Reads the next raw entry from the innermost open file.
    ///
    /// Returns the file’s path and the line number of the entry.
    fn next_entry(
        &mut self,
    ) -> Result<Option<(Arc<Path>, usize)>, ParseError> {
        match self.includes.last_mut() {
            Some(include) => include.source.next_entry(&mut self.entry),
            None => self.main.next_entry(&mut self.entry),
        }
    }

    /// Closes the innermost included file.
    ///
    /// Returns `false` if there wasn’t any.
    fn end_include(&mut self) -> bool {
        match self.includes.pop() {
            Some(include) => {
                debug!(
                    "end of included file {}",
                    include.source.path.display()
                );
                self.origin = include.origin;
                self.last_owner = include.last_owner;
                true
            }
            None => false,
        }
    }

    /// Processes the control entry currently in `self.entry`.
    fn process_control(&mut self, file: &Path) -> Result<(), ParseErrorKind> {
        match Control::scan(&self.entry)? {
            Control::Origin(origin) => {
                let origin = scan_name(origin, self.origin.as_ref())?;
                debug!("origin changed to {}", fmt_absolute(&origin));
                self.origin = Some(origin);
            }
            Control::Ttl(ttl) => {
                self.default_ttl = Some(Ttl::from_secs(ttl));
            }
            Control::Include { path, origin } => {
                if !self.follow_includes {
                    return Err(ParseErrorKind::IncludeDisabled);
                }
                if self.includes.len() >= MAX_INCLUDE_DEPTH {
                    return Err(ParseErrorKind::IncludeDepth);
                }
                let origin = match origin {
                    Some(origin) => {
                        Some(scan_name(origin, self.origin.as_ref())?)
                    }
                    None => None,
                };
                let path = include_path(file, path);
                let read = match File::open(&path) {
                    Ok(file) => BufReader::new(file),
                    Err(err) => {
                        return Err(ParseErrorKind::Include { path, err })
                    }
                };
                debug!("including {}", path.display());
                let saved_origin = match origin {
                    Some(origin) => self.origin.replace(origin),
                    None => self.origin.clone(),
                };
                self.includes.push(Include {
                    source: Source::new(read, path),
                    origin: saved_origin,
                    last_owner: self.last_owner.clone(),
                });
            }
        }
        Ok(())
    }

    /// Scans the record entry currently in `self.entry`.
    fn scan_record(&mut self) -> Result<ScannedRr, ParseErrorKind> {
        self.prepare_record()?;

        let mut zonefile = Zonefile::from(self.scan_buf.as_slice());
        if let Some(origin) = self.origin.clone() {
            zonefile.set_origin(origin);
        }
        let record = match zonefile.next_entry() {
            Ok(Some(Entry::Record(record))) => record,
            Ok(Some(Entry::Include { .. })) => {
                return Err(ParseErrorKind::UnknownControl("$INCLUDE".into()))
            }
            Ok(None) => {
                return Err(ParseErrorKind::Record("empty entry".into()))
            }
            Err(err) => return Err(scan_error(err)),
        };
        let record: StoredRecord = record.flatten_into();

        let owner = fmt_absolute(record.owner());
        self.last_owner = Some(owner.into_bytes());
        self.last_class = record.class();
        self.last_ttl = Some(record.ttl());
        Ok(ScannedRr::new(record))
    }

    /// Turns the raw record entry into something the scanner accepts.
    ///
    /// Writes the result to `self.scan_buf`. The result always contains an
    /// explicit owner, class, and TTL.
    fn prepare_record(&mut self) -> Result<(), ParseErrorKind> {
        let entry = self.entry.as_slice();
        let mut tokens = Tokens::new(entry);

        self.scan_buf.clear();
        let rest = if matches!(entry.first(), Some(b' ' | b'\t')) {
            let owner =
                self.last_owner.as_ref().ok_or(ParseErrorKind::MissingOwner)?;
            self.scan_buf.extend_from_slice(owner);
            0
        } else {
            let (owner, end) =
                tokens.next().ok_or(ParseErrorKind::MissingOwner)?;
            self.scan_buf.extend_from_slice(&entry[..end]);
            // Should the record fail, this is still the best guess for the
            // owner of the records that follow.
            self.last_owner = Some(owner.to_vec());
            end
        };

        // The TTL and class may appear in either order before the type.
        let (mut has_class, mut has_ttl) = (false, false);
        for (token, _) in tokens.take(2) {
            let token = match str::from_utf8(token) {
                Ok(token) => token,
                Err(_) => break,
            };
            if u32::from_str(token).is_ok() {
                has_ttl = true;
            } else if Rtype::from_str(token).is_ok() {
                break;
            } else if Class::from_str(token).is_ok() {
                has_class = true;
            } else {
                break;
            }
        }
        if !has_class {
            self.scan_buf.push(b' ');
            self.scan_buf
                .extend_from_slice(self.last_class.to_string().as_bytes());
        }
        if !has_ttl {
            let ttl = self
                .default_ttl
                .or(self.last_ttl)
                .unwrap_or(Ttl::from_secs(DEFAULT_TTL));
            self.scan_buf.push(b' ');
            self.scan_buf
                .extend_from_slice(ttl.as_secs().to_string().as_bytes());
        }

        let rest = &self.entry[rest..];
        if !rest.first().is_some_and(|ch| ch.is_ascii_whitespace()) {
            self.scan_buf.push(b' ');
        }
        self.scan_buf.extend_from_slice(rest);
        if self.scan_buf.last() != Some(&b'\n') {
            self.scan_buf.push(b'\n');
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for Reader<R> {
    type Item = Result<ScannedRr, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

//------------ Source --------------------------------------------------------

/// A single zonefile being read.
struct Source<R> {
    entries: EntryReader<R>,
    path: Arc<Path>,
}

impl<R: BufRead> Source<R> {
    fn new(read: R, path: PathBuf) -> Self {
        Source {
            entries: EntryReader::new(read),
            path: path.into(),
        }
    }

    fn next_entry(
        &mut self,
        buf: &mut Vec<u8>,
    ) -> Result<Option<(Arc<Path>, usize)>, ParseError> {
        let (line, kind) = match self.entries.next_entry(buf) {
            Ok(Some(line)) => return Ok(Some((self.path.clone(), line))),
            Ok(None) => return Ok(None),
            Err(EntryError::Read { line, err }) => {
                (line, ParseErrorKind::Read(err))
            }
            Err(EntryError::TooLong { line }) => {
                (line, ParseErrorKind::EntryTooLong)
            }
            Err(EntryError::Unbalanced { line }) => {
                (line, ParseErrorKind::Unbalanced)
            }
        };
        Err(ParseError::new(self.path.clone(), line, kind))
    }
}

//------------ Include -------------------------------------------------------

/// An included file and the state to return to once it ends.
struct Include {
    source: Source<BufReader<File>>,
    origin: Option<Name<Bytes>>,
    last_owner: Option<Vec<u8>>,
}

//------------ Helper Functions ----------------------------------------------

/// Converts an error from the record scanner.
///
/// The scanner’s position refers to the rewritten entry and is dropped.
///
/// The scanner’s error only exposes its message through `Display`, so the
/// missing origin is recognized by its wording.
fn scan_error(err: inplace::Error) -> ParseErrorKind {
    let err = err.to_string();
    let msg = err.splitn(3, ':').nth(2).map(str::trim).unwrap_or(&err);
    if msg == "missing origin" {
        ParseErrorKind::MissingOrigin
    } else {
        ParseErrorKind::Record(msg.into())
    }
}

/// Resolves the path given to `$INCLUDE`.
///
/// Relative paths are relative to the directory of the including file.
fn include_path(file: &Path, path: &[u8]) -> PathBuf {
    let path = Path::new(&*String::from_utf8_lossy(path)).to_path_buf();
    if path.is_relative() {
        if let Some(dir) = file.parent() {
            return dir.join(path);
        }
    }
    path
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::ZoneRecord;

    fn reader(data: &'static str) -> Reader<&'static [u8]> {
        Reader::new(data.as_bytes(), "test.zone")
    }

    fn owners(data: &'static str) -> Vec<Result<(String, Rtype), String>> {
        reader(data)
            .map(|item| {
                item.map(|rr| (rr.owner().to_string(), rr.rtype()))
                    .map_err(|err| err.to_string())
            })
            .collect()
    }

    #[test]
    fn simple_records() {
        assert_eq!(
            owners(
                "example.com. 3600 IN SOA ns1.example.com. \
                 admin.example.com. 1 7200 3600 1209600 3600\n\
                 example.com. 3600 IN NS ns1.example.com.\n\
                 ns1.example.com. 3600 IN A 192.0.2.1\n"
            ),
            [
                Ok((String::from("example.com."), Rtype::SOA)),
                Ok((String::from("example.com."), Rtype::NS)),
                Ok((String::from("ns1.example.com."), Rtype::A)),
            ]
        );
    }

    #[test]
    fn multi_line_record() {
        let mut reader = reader(
            "example.com. IN SOA ns1.example.com. admin.example.com. (\n\
             \t2024010101 ; serial\n\
             \t7200 3600 1209600 3600 )\n",
        );
        let rr = reader.next().unwrap().unwrap();
        assert_eq!(rr.rtype(), Rtype::SOA);
        assert!(reader.next().is_none());
    }

    #[test]
    fn inherited_owner_class_and_ttl() {
        let mut reader = reader(
            "$TTL 300\n\
             example.com. CH NS ns1.example.com.\n\
             \tNS ns2.example.com.\n",
        );
        let first = reader.next().unwrap().unwrap();
        let second = reader.next().unwrap().unwrap();
        assert_eq!(second.owner(), "example.com.");
        assert_eq!(second.rdata(), "ns2.example.com.");
        assert_eq!(second.record().class(), Class::CH);
        assert_eq!(first.record().ttl(), Ttl::from_secs(300));
        assert_eq!(second.record().ttl(), Ttl::from_secs(300));
    }

    #[test]
    fn defaults_without_class_and_ttl() {
        let rr = reader("example.com. NS ns1.example.com.\n")
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(rr.record().class(), Class::IN);
        assert_eq!(rr.record().ttl(), Ttl::from_secs(DEFAULT_TTL));
    }

    #[test]
    fn origin() {
        assert_eq!(
            owners(
                "$ORIGIN example.com.\n\
                 @ NS ns1\n\
                 www A 192.0.2.1\n\
                 $ORIGIN sub\n\
                 host A 192.0.2.2\n"
            ),
            [
                Ok((String::from("example.com."), Rtype::NS)),
                Ok((String::from("www.example.com."), Rtype::A)),
                Ok((String::from("host.sub.example.com."), Rtype::A)),
            ]
        );
    }

    #[test]
    fn origin_follows_control_entries() {
        let mut reader = reader(
            "$ORIGIN example.com.\n\
             $ORIGIN sub\n\
             host A 192.0.2.2\n",
        );
        assert!(reader.origin().is_none());
        assert!(reader.next().unwrap().is_ok());
        assert_eq!(
            reader.origin(),
            Some(&Name::from_str("sub.example.com.").unwrap())
        );
    }

    #[test]
    fn preset_origin() {
        let mut reader = reader("www 3600 IN A 192.0.2.1\n");
        reader.set_origin(Name::from_str("example.org.").unwrap());
        assert_eq!(
            reader.next().unwrap().unwrap().owner(),
            "www.example.org."
        );
    }

    #[test]
    fn relative_without_origin() {
        let mut reader = reader("www 3600 IN A 192.0.2.1\n");
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::MissingOrigin));
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn continue_after_error() {
        let res = owners(
            "a.example. 3600 IN A not-an-address\n\
             b.example. 3600 IN A 192.0.2.1\n\
             $GENERATE 1-4 host$ A 192.0.2.$\n\
             c.example. 3600 IN AAAA 2001:db8::1\n",
        );
        assert_eq!(res.len(), 4);
        assert!(res[0].as_ref().unwrap_err().starts_with("test.zone:1: "));
        assert_eq!(res[1], Ok((String::from("b.example."), Rtype::A)));
        assert!(res[2].as_ref().unwrap_err().contains("$GENERATE"));
        assert_eq!(res[3], Ok((String::from("c.example."), Rtype::AAAA)));
    }

    #[test]
    fn missing_owner() {
        let err = reader("  NS ns1.example.com.\n")
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::MissingOwner));
    }

    #[test]
    fn disabled_includes() {
        let mut reader = reader(
            "$INCLUDE other.zone\n\
             example.com. NS ns1.example.com.\n",
        );
        reader.set_follow_includes(false);
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::IncludeDisabled));
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().is_none());
    }

    #[test]
    fn missing_include() {
        let mut reader = reader("$INCLUDE does-not-exist.zone\n");
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::Include { .. }));
        assert!(reader.next().is_none());
    }

    #[test]
    fn scanner_errors() {
        let mut zonefile =
            Zonefile::from(&b"www 3600 IN A 192.0.2.1\n"[..]);
        let err = zonefile.next_entry().unwrap_err();
        assert!(matches!(scan_error(err), ParseErrorKind::MissingOrigin));

        let mut zonefile =
            Zonefile::from(&b"www. 3600 IN A not-an-address\n"[..]);
        let err = zonefile.next_entry().unwrap_err();
        match scan_error(err) {
            ParseErrorKind::Record(msg) => {
                assert!(!msg.is_empty());
                assert!(!msg.starts_with(|ch: char| ch.is_ascii_digit()));
            }
            kind => panic!("unexpected error {}", kind),
        }
    }

    #[test]
    fn read_error_ends_the_file() {
        struct Failing;

        impl io::Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "boom"))
            }
        }

        let data = &b"a.example. 3600 IN A 192.0.2.1\n"[..];
        let mut reader = Reader::new(
            BufReader::new(io::Read::chain(data, Failing)),
            "test.zone",
        );
        assert_eq!(reader.next().unwrap().unwrap().owner(), "a.example.");
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::Read(_)));
        assert_eq!(err.to_string(), "test.zone:2: read error: boom");
        assert!(reader.next().is_none());
    }

    #[test]
    fn broken_framing_is_reported() {
        let res = owners(
            "a.example. 3600 IN A 192.0.2.1\n\
             )\n\
             b.example. 3600 IN A 192.0.2.2\n",
        );
        assert_eq!(res.len(), 3);
        assert_eq!(
            res[1],
            Err(String::from("test.zone:2: unbalanced parentheses"))
        );
        assert_eq!(res[2], Ok((String::from("b.example."), Rtype::A)));
    }

    #[test]
    fn include_paths() {
        assert_eq!(
            include_path(Path::new("zones/main.zone"), b"sub.zone"),
            Path::new("zones/sub.zone")
        );
        assert_eq!(
            include_path(Path::new("zones/main.zone"), b"/etc/sub.zone"),
            Path::new("/etc/sub.zone")
        );
    }
}
