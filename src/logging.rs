use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Setup logging of events reported while reading a zone.
///
/// By default, only warnings and errors are shown. These include every
/// entry that failed to parse. Log output goes to stderr so it never mixes
/// with the report.
///
/// Use the RUST_LOG environment variable to override the defaults.
///
/// E.g. To enable debug level logging:
///   RUST_LOG=DEBUG
///
/// Or to silence the reports of broken entries:
///   RUST_LOG=statzone=ERROR
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .try_init()
        .ok();
}
