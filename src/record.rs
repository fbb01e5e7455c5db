//! Resource records as seen by the statistics.
//!
//! The statistics only need three things from a record: its owner name,
//! its record type, and the textual form of its data. The [`ZoneRecord`]
//! trait provides exactly that so the aggregation doesn’t need to care
//! where records come from.

use bytes::Bytes;
use domain::base::iana::Rtype;
use domain::base::{Name, Record};
use domain::rdata::ZoneRecordData;

//------------ Type Aliases --------------------------------------------------

/// A [`Bytes`] backed record with absolute names.
pub type StoredRecord =
    Record<Name<Bytes>, ZoneRecordData<Bytes, Name<Bytes>>>;

//------------ ZoneRecord ----------------------------------------------------

/// A resource record to be counted.
pub trait ZoneRecord {
    /// Returns the owner name in presentation format.
    ///
    /// Absolute names end in a dot.
    fn owner(&self) -> &str;

    /// Returns the record type.
    fn rtype(&self) -> Rtype;

    /// Returns the record data in presentation format.
    ///
    /// This is only asked for where the data is actually needed, so
    /// implementations may choose to produce it lazily.
    fn rdata(&self) -> String;
}

impl<T: ZoneRecord + ?Sized> ZoneRecord for &T {
    fn owner(&self) -> &str {
        (**self).owner()
    }

    fn rtype(&self) -> Rtype {
        (**self).rtype()
    }

    fn rdata(&self) -> String {
        (**self).rdata()
    }
}

//------------ ScannedRr -----------------------------------------------------

/// A record read from a zonefile.
#[derive(Clone, Debug)]
pub struct ScannedRr {
    /// The owner name, rendered once for comparisons.
    owner: String,

    /// The record itself.
    record: StoredRecord,
}

impl ScannedRr {
    pub fn new(record: StoredRecord) -> Self {
        ScannedRr {
            owner: fmt_absolute(record.owner()),
            record,
        }
    }

    /// Returns a reference to the underlying record.
    pub fn record(&self) -> &StoredRecord {
        &self.record
    }

    /// Converts the value into the underlying record.
    pub fn into_record(self) -> StoredRecord {
        self.record
    }
}

impl ZoneRecord for ScannedRr {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn rtype(&self) -> Rtype {
        self.record.rtype()
    }

    fn rdata(&self) -> String {
        match self.record.data() {
            // Name servers are compared by name, so make sure the format
            // doesn’t depend on how the name was written in the file.
            ZoneRecordData::Ns(ns) => fmt_absolute(ns.nsdname()),
            data => data.to_string(),
        }
    }
}

//------------ Rr ------------------------------------------------------------

/// A record made of plain values.
///
/// This is useful when records come from somewhere else than a zonefile.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Rr {
    owner: String,
    rtype: Rtype,
    rdata: String,
}

impl Rr {
    pub fn new(
        owner: impl Into<String>,
        rtype: Rtype,
        rdata: impl Into<String>,
    ) -> Self {
        Rr {
            owner: owner.into(),
            rtype,
            rdata: rdata.into(),
        }
    }
}

impl ZoneRecord for Rr {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn rtype(&self) -> Rtype {
        self.rtype
    }

    fn rdata(&self) -> String {
        self.rdata.clone()
    }
}

//------------ Helper Functions ----------------------------------------------

/// Formats an absolute name always ending in a single dot.
pub fn fmt_absolute(name: &Name<Bytes>) -> String {
    if name.is_root() {
        String::from(".")
    } else {
        format!("{}.", name)
    }
}

//============ Tests =========================================================
