//! Collecting zone statistics.
//!
//! This module contains the [`Aggregator`] which consumes the records of a
//! zone in a single pass and keeps running statistics. Once all records
//! have been consumed, it is turned into a [`Stats`] snapshot.
//!
//! The interesting numbers are derived from two record types. NS records
//! mark delegations: every owner of an NS record set other than the apex
//! is a delegated domain, and the record data names the zone’s name
//! servers. DS records mark delegations that are signed.
//!
//! Counting delegated domains relies on all NS records of a domain being
//! next to each other in the zonefile, which is the case for sorted zones.
//! A domain is counted whenever the owner of an NS record differs from the
//! owner of the previous NS record. If a zone is not sorted, domains whose
//! NS records are spread out are counted more than once. This keeps memory
//! use independent of the number of domains. Alternatively, the
//! [`DomainCounting::Distinct`] policy remembers every owner seen and
//! counts each exactly once.

use crate::progress::{Mark, NoProgress, Progress};
use crate::record::ZoneRecord;
use crate::report::{Stats, TypeCount};
use domain::base::iana::Rtype;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::warn;

//------------ Constants -----------------------------------------------------

/// The label prefix marking an internationalized domain name.
const IDN_PREFIX: &str = "xn--";

//------------ DomainCounting ------------------------------------------------

/// How to decide whether an NS record belongs to a new domain.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DomainCounting {
    /// A new domain starts whenever the owner changes.
    ///
    /// This requires all NS records of a domain to appear together.
    #[default]
    Contiguous,

    /// A new domain is any owner not seen before on an NS record.
    Distinct,
}

//------------ Aggregator ----------------------------------------------------

/// The running statistics of a zone.
#[derive(Clone, Debug)]
pub struct Aggregator<P = NoProgress> {
    /// The number of records per record type.
    rtypes: BTreeMap<Rtype, u64>,

    /// The number of records consumed.
    records: u64,

    /// The number of entries that failed to parse.
    parse_errors: u64,

    /// The number of domains seen so far, including the apex.
    domains: u64,

    /// The number of domains that are IDNs.
    idns: u64,

    /// Tracks which NS owners have been counted.
    owners: Owners,

    /// The distinct name servers.
    name_servers: HashSet<String>,

    /// The distinct owners of DS records.
    signed: HashSet<String>,

    /// Where to send progress marks.
    progress: P,
}

impl Aggregator {
    /// Creates new, empty statistics using the default policy.
    pub fn new() -> Self {
        Self::with_progress(DomainCounting::default(), NoProgress)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Progress> Aggregator<P> {
    /// Creates new, empty statistics.
    pub fn with_progress(policy: DomainCounting, progress: P) -> Self {
        Aggregator {
            rtypes: BTreeMap::new(),
            records: 0,
            parse_errors: 0,
            domains: 0,
            idns: 0,
            owners: Owners::new(policy),
            name_servers: HashSet::new(),
            signed: HashSet::new(),
            progress,
        }
    }

    /// Adds a record to the statistics.
    pub fn push(&mut self, record: &impl ZoneRecord) {
        self.records += 1;
        let rtype = record.rtype();
        *self.rtypes.entry(rtype).or_insert(0) += 1;
        if rtype == Rtype::NS {
            self.push_ns(record)
        } else if rtype == Rtype::DS {
            self.push_ds(record)
        }
    }

    /// Notes a position in the input that could not be parsed.
    ///
    /// The error is logged. Apart from counting the error, the statistics
    /// are not changed.
    pub fn push_error(&mut self, err: &impl fmt::Display) {
        warn!("{}", err);
        self.parse_errors += 1;
    }

    /// Consumes all items of a record source.
    pub fn consume<I, R, E>(&mut self, source: I)
    where
        I: IntoIterator<Item = Result<R, E>>,
        R: ZoneRecord,
        E: fmt::Display,
    {
        for item in source {
            match item {
                Ok(record) => self.push(&record),
                Err(err) => self.push_error(&err),
            }
        }
    }

    /// Converts the running statistics into the final snapshot.
    ///
    /// The apex of the zone has an NS record set, too, which was counted
    /// as a domain. It is removed here.
    pub fn finish(self) -> Stats {
        Stats::new(
            self.records,
            self.parse_errors,
            self.rtypes
                .into_iter()
                .map(|(rtype, count)| TypeCount { rtype, count })
                .collect(),
            self.domains.saturating_sub(1),
            self.idns,
            self.name_servers.len() as u64,
            self.signed.len() as u64,
        )
    }

    /// Returns the number of records consumed so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Processes an NS record.
    fn push_ns(&mut self, record: &impl ZoneRecord) {
        self.name_servers.insert(record.rdata());

        let owner = record.owner();
        if !self.owners.is_new(owner) {
            return;
        }
        self.domains += 1;
        if is_idn(owner) {
            self.idns += 1;
        }
        if let Some(mark) = Mark::for_count(self.domains) {
            self.progress.mark(mark)
        }
    }

    /// Processes a DS record.
    fn push_ds(&mut self, record: &impl ZoneRecord) {
        let owner = record.owner();
        if !self.signed.contains(owner) {
            self.signed.insert(owner.into());
        }
    }
}

//------------ Owners --------------------------------------------------------

/// The owners of NS records that have been counted.
#[derive(Clone, Debug)]
enum Owners {
    /// Only the last owner is kept.
    Contiguous(Option<String>),

    /// All owners are kept.
    Distinct(HashSet<String>),
}

impl Owners {
    fn new(policy: DomainCounting) -> Self {
        match policy {
            DomainCounting::Contiguous => Owners::Contiguous(None),
            DomainCounting::Distinct => Owners::Distinct(HashSet::new()),
        }
    }

    /// Returns whether `owner` starts a new domain and remembers it.
    fn is_new(&mut self, owner: &str) -> bool {
        match self {
            Owners::Contiguous(Some(last)) => {
                if last == owner {
                    false
                } else {
                    last.clear();
                    last.push_str(owner);
                    true
                }
            }
            Owners::Contiguous(last) => {
                *last = Some(owner.into());
                true
            }
            Owners::Distinct(seen) => {
                if seen.contains(owner) {
                    false
                } else {
                    seen.insert(owner.into());
                    true
                }
            }
        }
    }
}

//------------ Helper Functions ----------------------------------------------

/// Returns whether a domain name is an IDN.
///
/// Only the start of the name is checked, i.e., the leftmost label.
fn is_idn(owner: &str) -> bool {
    owner
        .get(..IDN_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(IDN_PREFIX))
}

/// Collects the statistics of all items of a record source.
pub fn collect<I, R, E, P>(source: I, policy: DomainCounting, progress: P) -> Stats
where
    I: IntoIterator<Item = Result<R, E>>,
    R: ZoneRecord,
    E: fmt::Display,
    P: Progress,
{
    let mut stats = Aggregator::with_progress(policy, progress);
    stats.consume(source);
    stats.finish()
}

//============ Tests =========================================================
