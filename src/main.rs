use bytes::Bytes;
use clap::Parser;
use domain::base::Name;
use statzone::logging::init_logging;
use statzone::progress::{NoProgress, WriterProgress};
use statzone::source::Reader;
use statzone::stats::{collect, DomainCounting};
use statzone::{Error, Stats};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

//------------ Args ----------------------------------------------------------

/// Collect statistics of a DNS zonefile
///
/// Counts records per type, delegated domains, IDNs, DNSSEC signed
/// delegations, and distinct name servers. Entries that fail to parse are
/// reported on stderr and skipped.
#[derive(Clone, Debug, Parser)]
#[command(version)]
struct Args {
    /// The zonefile to read
    #[arg(value_name = "ZONEFILE")]
    zonefile: PathBuf,

    /// Origin for the zone (for zonefiles with relative names and no $ORIGIN)
    #[arg(short = 'o', long, value_name = "domain")]
    origin: Option<Name<Bytes>>,

    /// Count each NS owner once even if the zone is not sorted
    #[arg(long, default_value_t = false)]
    distinct_owners: bool,

    /// Treat $INCLUDE entries as errors instead of following them
    #[arg(long, default_value_t = false)]
    no_includes: bool,

    /// Don't show progress while reading
    #[arg(short = 'q', long, default_value_t = false)]
    quiet: bool,

    /// Print the statistics as JSON instead of the report
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Args {
    fn policy(&self) -> DomainCounting {
        if self.distinct_owners {
            DomainCounting::Distinct
        } else {
            DomainCounting::Contiguous
        }
    }

    fn execute(self) -> Result<(), Error> {
        let mut out = io::stdout().lock();
        if !self.json {
            Stats::write_banner(&mut out, &self.zonefile)?;
            out.flush()?;
        }

        let mut reader = Reader::open(&self.zonefile)
            .map_err(|err| Error::open(&self.zonefile, err))?;
        if let Some(origin) = &self.origin {
            reader.set_origin(origin.clone());
        }
        reader.set_follow_includes(!self.no_includes);

        info!("reading {}", self.zonefile.display());
        let stats = if self.quiet || self.json {
            collect(reader, self.policy(), NoProgress)
        } else {
            let stats = collect(reader, self.policy(), WriterProgress::stderr());
            eprintln!();
            stats
        };

        if self.json {
            stats.write_json(&mut out)?;
        } else {
            stats.write_text(&mut out)?;
        }
        out.flush()?;
        Ok(())
    }
}

//------------ main ----------------------------------------------------------

fn main() -> ExitCode {
    init_logging();
    match Args::parse().execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("statzone: {}", err);
            ExitCode::FAILURE
        }
    }
}
