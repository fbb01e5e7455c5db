//! The statistics snapshot and its output formats.
//!
//! The aggregation produces a [`Stats`] value once all records have been
//! consumed. It can be written as the human-readable report, as a CSV
//! summary, or as JSON.

use domain::base::iana::Rtype;
use serde::{Serialize, Serializer};
use std::io::{self, Write};
use std::path::Path;

//------------ Constants -----------------------------------------------------

/// The width of the banner and section headers of the text report.
const WIDTH: usize = 79;

//------------ Stats ---------------------------------------------------------

/// The statistics of a zone.
///
/// This is the final, immutable result of a run. Produce one via
/// [`Aggregator::finish`][crate::stats::Aggregator::finish].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Stats {
    /// The number of records successfully read.
    records: u64,

    /// The number of entries that could not be read.
    parse_errors: u64,

    /// The number of records per record type.
    ///
    /// Only contains types that appeared, ordered by their numeric value.
    rtypes: Vec<TypeCount>,

    /// The number of delegated domains.
    domains: u64,

    /// The number of delegated domains that are IDNs.
    idns: u64,

    /// The number of distinct name servers.
    name_servers: u64,

    /// The number of delegated domains with DS records.
    signed: u64,
}

impl Stats {
    pub(crate) fn new(
        records: u64,
        parse_errors: u64,
        rtypes: Vec<TypeCount>,
        domains: u64,
        idns: u64,
        name_servers: u64,
        signed: u64,
    ) -> Self {
        Stats {
            records,
            parse_errors,
            rtypes,
            domains,
            idns,
            name_servers,
            signed,
        }
    }

    /// Returns the number of records successfully read.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Returns the number of entries that failed to read.
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors
    }

    /// Returns the record counts of all record types that appeared.
    pub fn rtypes(&self) -> &[TypeCount] {
        &self.rtypes
    }

    /// Returns the number of records of the given type.
    pub fn count(&self, rtype: Rtype) -> u64 {
        self.rtypes
            .binary_search_by(|item| item.rtype.cmp(&rtype))
            .map(|idx| self.rtypes[idx].count)
            .unwrap_or(0)
    }

    /// Returns the number of delegated domains.
    ///
    /// The apex of the zone is not included.
    pub fn domains(&self) -> u64 {
        self.domains
    }

    /// Returns the number of delegated domains that are IDNs.
    pub fn idns(&self) -> u64 {
        self.idns
    }

    /// Returns the number of distinct name servers.
    pub fn name_servers(&self) -> u64 {
        self.name_servers
    }

    /// Returns the number of DNSSEC-signed delegated domains.
    pub fn signed(&self) -> u64 {
        self.signed
    }

    /// Returns the values of the CSV summary.
    pub fn csv_summary(&self) -> CsvSummary {
        CsvSummary {
            ipv4_glue: self.count(Rtype::A),
            ipv6_glue: self.count(Rtype::AAAA),
            ns: self.count(Rtype::NS),
            unique_ns: self.name_servers,
            ds: self.count(Rtype::DS),
            signed: self.signed,
            idns: self.idns,
            domains: self.domains,
        }
    }
}

/// # Output
///
impl Stats {
    /// Writes the report header shown before processing starts.
    pub fn write_banner(
        target: &mut impl Write,
        path: &Path,
    ) -> Result<(), io::Error> {
        writeln!(target, "{}", "-".repeat(WIDTH))?;
        writeln!(target, "{:^width$}", "StatZone", width = WIDTH)?;
        writeln!(target, "{}", "-".repeat(WIDTH))?;
        writeln!(target)?;
        writeln!(target, "Parsing zone : {}", path.display())
    }

    /// Writes the human-readable report.
    ///
    /// The report ends with the CSV summary.
    pub fn write_text(&self, target: &mut impl Write) -> Result<(), io::Error> {
        writeln!(target)?;
        write_section(target, "Parsing results")?;
        writeln!(target, "{} RRs parsed.", self.records)?;
        if self.parse_errors > 0 {
            writeln!(target, "{} entries failed to parse.", self.parse_errors)?;
        }
        for item in &self.rtypes {
            writeln!(target, "{} records : {}", item.rtype, item.count)?;
        }

        writeln!(target)?;
        write_section(target, "Results")?;
        writeln!(target, "Domains : {}", self.domains)?;
        writeln!(target, "DNSSEC Signed : {}", self.signed)?;
        writeln!(target, "IDNs : {}", self.idns)?;
        writeln!(target, "NS : {}", self.name_servers)?;

        writeln!(target)?;
        write_section(target, "CSV values")?;
        self.write_csv(&mut *target)?;
        Ok(())
    }

    /// Writes the CSV summary.
    ///
    /// This is a header line and a line with the values, both separated by
    /// semicolons.
    pub fn write_csv(&self, target: impl Write) -> Result<(), csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(target);
        writer.serialize(self.csv_summary())?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the statistics as JSON.
    pub fn write_json(
        &self,
        target: &mut impl Write,
    ) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(&mut *target, self)?;
        writeln!(target).map_err(serde_json::Error::io)
    }
}

//------------ TypeCount -----------------------------------------------------

/// The number of records of a record type.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct TypeCount {
    #[serde(serialize_with = "serialize_rtype")]
    pub rtype: Rtype,
    pub count: u64,
}

fn serialize_rtype<S: Serializer>(
    rtype: &Rtype,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(rtype)
}

//------------ CsvSummary ----------------------------------------------------

/// The values of the CSV summary line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct CsvSummary {
    #[serde(rename = "IPv4 Glue")]
    pub ipv4_glue: u64,

    #[serde(rename = "IPv6 Glue")]
    pub ipv6_glue: u64,

    #[serde(rename = "NS")]
    pub ns: u64,

    #[serde(rename = "Unique NS")]
    pub unique_ns: u64,

    #[serde(rename = "DS")]
    pub ds: u64,

    #[serde(rename = "Signed")]
    pub signed: u64,

    #[serde(rename = "IDNs")]
    pub idns: u64,

    #[serde(rename = "Domains")]
    pub domains: u64,
}

//------------ Helper Functions ----------------------------------------------

/// Writes a section header padded to the full width.
fn write_section(
    target: &mut impl Write,
    title: &str,
) -> Result<(), io::Error> {
    let head = format!("---[ {} ]", title);
    writeln!(target, "{:-<width$}", head, width = WIDTH)?;
    writeln!(target)
}

//============ Tests =========================================================
