//! Stderr logging for the measurement tools.
//!
//! Library crates only emit through the `log` facade. Binaries install either
//! the small stderr sink below or, with the `tracing` feature, a
//! `tracing-subscriber` pipeline.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, fmt::format::FmtSpan, util::SubscriberInitExt, EnvFilter};

/// Lines look like `[  0.125s  INFO pipeline] measured 3 images`.
struct StderrSink {
    level: LevelFilter,
    started: Instant,
}

impl StderrSink {
    fn module_of<'a>(record: &'a Record<'_>) -> &'a str {
        record.target().rsplit("::").next().unwrap_or_default()
    }
}

impl Log for StderrSink {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let secs = self.started.elapsed().as_secs_f64();
        let mut out = std::io::stderr().lock();
        let _ = writeln!(
            out,
            "[{secs:8.3}s {:>5} {}] {}",
            record.level(),
            Self::module_of(record),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static SINK: OnceLock<StderrSink> = OnceLock::new();

/// Install the stderr sink with the given level.
///
/// Only the first call installs anything; later calls return `Ok(())`.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if SINK.get().is_some() {
        return Ok(());
    }
    let sink = SINK.get_or_init(|| StderrSink {
        level,
        started: Instant::now(),
    });
    log::set_logger(sink)?;
    log::set_max_level(level);
    Ok(())
}

/// Parse a level name (`"debug"`, `"WARN"`, `"off"`, ...), falling back to
/// `Info` for anything unrecognized.
pub fn parse_level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Install a `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_directive`. With `json` every event becomes a
/// flattened JSON line; otherwise output is human-readable with uptime stamps.
/// Closing spans report their busy time, which is how per-stage timings of a
/// measurement show up.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
