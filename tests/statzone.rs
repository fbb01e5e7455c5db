//! Statistics of the zonefiles in test-data/zonefiles.

use domain::base::iana::Rtype;
use rstest::rstest;
use statzone::progress::NoProgress;
use statzone::record::fmt_absolute;
use statzone::source::{ParseErrorKind, Reader};
use statzone::stats::{collect, Aggregator, DomainCounting};
use statzone::Stats;
use std::path::{Path, PathBuf};
use std::process::Command;

fn zonefile(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test-data/zonefiles")
        .join(name)
}

fn stats(name: &str) -> Stats {
    let reader = Reader::open(zonefile(name)).unwrap();
    collect(reader, DomainCounting::Contiguous, NoProgress)
}

fn csv(stats: &Stats) -> String {
    let mut buf = Vec::new();
    stats.write_csv(&mut buf).unwrap();
    String::from_utf8(buf).unwrap().lines().nth(1).unwrap().to_string()
}

#[test]
fn delegation_to_idn() {
    let stats = stats("root.zone");
    assert_eq!(stats.parse_errors(), 0);
    assert_eq!(stats.records(), 8);
    assert_eq!(stats.count(Rtype::NS), 4);
    assert_eq!(stats.count(Rtype::SOA), 1);
    assert_eq!(stats.domains(), 1);
    assert_eq!(stats.idns(), 1);
    assert_eq!(stats.name_servers(), 4);
    assert_eq!(csv(&stats), "2;1;4;4;0;0;1;1");
}

#[test]
fn zone_without_delegations() {
    let stats = stats("soa-only.zone");
    assert_eq!(stats.records(), 1);
    assert_eq!(stats.domains(), 0);
    assert_eq!(csv(&stats), "0;0;0;0;0;0;0;0");
}

#[test]
fn signed_delegation() {
    let stats = stats("signed.zone");
    assert_eq!(stats.parse_errors(), 0);
    assert_eq!(stats.records(), 10);
    assert_eq!(stats.count(Rtype::DS), 2);
    assert_eq!(stats.signed(), 1);
    assert_eq!(stats.domains(), 2);
    assert_eq!(csv(&stats), "2;0;5;4;2;1;0;2");
}

#[test]
fn included_delegations() {
    let stats = stats("main-include.zone");
    assert_eq!(stats.parse_errors(), 0);
    assert_eq!(stats.records(), 9);
    assert_eq!(stats.count(Rtype::NS), 8);
    assert_eq!(stats.domains(), 4);
    assert_eq!(stats.idns(), 1);
    assert_eq!(stats.name_servers(), 7);
}

#[test]
fn included_owners() {
    let owners: Vec<_> = Reader::open(zonefile("main-include.zone"))
        .unwrap()
        .map(|record| record.unwrap())
        .filter(|record| record.record().rtype() == Rtype::NS)
        .map(|record| fmt_absolute(record.record().owner()))
        .collect();
    assert_eq!(
        owners,
        [
            "test.",
            "test.",
            "one.sub.test.",
            "one.sub.test.",
            "two.sub.test.",
            "xn--drei.sub.test.",
            "alpha.test.",
            "alpha.test.",
        ]
    );
}

#[test]
fn disabled_includes() {
    let mut reader = Reader::open(zonefile("main-include.zone")).unwrap();
    reader.set_follow_includes(false);
    let mut errors = Vec::new();
    let mut stats = Aggregator::new();
    for item in reader {
        match item {
            Ok(record) => stats.push(&record),
            Err(err) => {
                assert!(matches!(err.kind(), ParseErrorKind::IncludeDisabled));
                assert_eq!(err.line(), 6);
                errors.push(err);
            }
        }
    }
    assert_eq!(errors.len(), 1);
    let stats = stats.finish();
    assert_eq!(stats.records(), 5);
    assert_eq!(stats.domains(), 1);
}

#[test]
fn nested_includes_are_limited() {
    let mut errors = Vec::new();
    let mut stats = Aggregator::new();
    for item in Reader::open(zonefile("include/self.zone")).unwrap() {
        match item {
            Ok(record) => stats.push(&record),
            Err(err) => errors.push(err),
        }
    }
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].kind(), ParseErrorKind::IncludeDepth));
    assert_eq!(errors[0].line(), 2);

    // The file itself plus seven levels of nesting.
    assert_eq!(stats.records(), 8);
    let stats = stats.finish();
    assert_eq!(stats.count(Rtype::NS), 8);
    assert_eq!(stats.domains(), 0);
}

#[test]
fn broken_entries_are_skipped() {
    let lines: Vec<_> = Reader::open(zonefile("broken.zone"))
        .unwrap()
        .filter_map(Result::err)
        .map(|err| err.line())
        .collect();
    assert_eq!(lines, [6, 9]);

    let stats = stats("broken.zone");
    assert_eq!(stats.parse_errors(), 2);
    assert_eq!(stats.records(), 6);
    assert_eq!(stats.count(Rtype::A), 0);
    assert_eq!(stats.domains(), 3);
}

#[rstest]
fn deterministic(#[files("test-data/zonefiles/*.zone")] path: PathBuf) {
    let first = collect(
        Reader::open(&path).unwrap(),
        DomainCounting::Contiguous,
        NoProgress,
    );
    let second = collect(
        Reader::open(&path).unwrap(),
        DomainCounting::Contiguous,
        NoProgress,
    );
    assert_eq!(first, second);
}

#[rstest]
#[case("root.zone", 1)]
#[case("signed.zone", 2)]
#[case("main-include.zone", 4)]
#[case("broken.zone", 3)]
fn distinct_owners_on_sorted_zones(#[case] name: &str, #[case] domains: u64) {
    let stats = collect(
        Reader::open(zonefile(name)).unwrap(),
        DomainCounting::Distinct,
        NoProgress,
    );
    assert_eq!(stats.domains(), domains);
}

#[test]
fn report() {
    let output = Command::new(env!("CARGO_BIN_EXE_statzone"))
        .arg(zonefile("signed.zone"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Parsing zone : "));
    assert!(stdout.lines().any(|line| line == "Domains : 2"));
    assert!(stdout.lines().any(|line| line == "DNSSEC Signed : 1"));
    assert_eq!(stdout.lines().last(), Some("2;0;5;4;2;1;0;2"));
}

#[test]
fn json_report() {
    let output = Command::new(env!("CARGO_BIN_EXE_statzone"))
        .arg("--json")
        .arg(zonefile("root.zone"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["domains"], 1);
    assert_eq!(value["idns"], 1);
}

#[test]
fn missing_zonefile() {
    let output = Command::new(env!("CARGO_BIN_EXE_statzone"))
        .arg(zonefile("does-not-exist.zone"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("cannot open"));
}
