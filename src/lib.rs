//! Statistics of DNS zonefiles.
//!
//! This crate reads a zonefile – typically a large TLD zone – in a single
//! pass and counts a few things interesting to zone operators: the number
//! of records per record type, the number of delegated domains, how many
//! of those are internationalized or DNSSEC signed, and how many distinct
//! name servers the delegations refer to.
//!
//! # Modules
//!
//! * [source] reads the entries of a zonefile, including `$ORIGIN`,
//!   `$TTL`, and `$INCLUDE` control entries, and produces records. Entries
//!   that fail to parse are reported and skipped.
//! * [stats] contains the [`Aggregator`] collecting the statistics.
//! * [report] contains the final [`Stats`] and writes them as a
//!   human-readable report, as a CSV summary, or as JSON.
//! * [progress] shows that work is happening while a large zone is read.
//!
//! # Example
//!
//! ```no_run
//! use statzone::progress::NoProgress;
//! use statzone::source::Reader;
//! use statzone::stats::{collect, DomainCounting};
//!
//! let reader = Reader::open("com.zone").unwrap();
//! let stats = collect(reader, DomainCounting::Contiguous, NoProgress);
//! println!("{} delegated domains", stats.domains());
//! ```

pub mod error;
pub mod logging;
pub mod progress;
pub mod record;
pub mod report;
pub mod source;
pub mod stats;

pub use self::error::Error;
pub use self::report::Stats;
pub use self::stats::{Aggregator, DomainCounting};
