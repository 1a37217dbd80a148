//! Logging setup shared by the library crates and the CLI.
//!
//! [`init_with_level`] installs a stderr sink for the `log` facade that prints
//! `[elapsed LEVEL stage] message`, where `stage` is the record target with
//! the `roadspeed_` crate prefix dropped (`core::ssim`, `tracker::tracker`).
//! Records from other crates only pass at `Warn` and above. With the
//! `tracing` feature, [`init_tracing`] installs a `tracing-subscriber`
//! formatter instead; it also receives `log` records.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const OWN_PREFIX: &str = "roadspeed";

/// `roadspeed_core::ssim` -> `core::ssim`; foreign targets unchanged.
fn stage_of(target: &str) -> &str {
    target
        .strip_prefix("roadspeed_")
        .or_else(|| target.strip_prefix("roadspeed::"))
        .unwrap_or(target)
}

/// Own records pass at `level`; dependency records need `Warn` as well.
fn passes(level: LevelFilter, target: &str, record_level: Level) -> bool {
    if !target.starts_with(OWN_PREFIX) && record_level > Level::Warn {
        return false;
    }
    record_level <= level
}

struct StageLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        passes(self.level, metadata.target(), metadata.level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let secs = self.started.elapsed().as_secs_f64();
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{secs:8.3}s {:>5} {}] {}",
            record.level(),
            stage_of(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// Install the stderr logger. The first call wins; later calls are no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StageLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// `RUST_LOG`-style directives when given and valid, otherwise `fallback`.
#[cfg(feature = "tracing")]
fn filter_from(directives: Option<&str>, fallback: LevelFilter) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback.to_string().to_ascii_lowercase()))
}

/// Install a `tracing` fmt subscriber with span-close events.
///
/// `RUST_LOG` takes precedence when set; otherwise events at `level` and
/// above are kept.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, level: LevelFilter) {
    let env = std::env::var("RUST_LOG").ok();
    let builder = fmt()
        .with_env_filter(filter_from(env.as_deref(), level))
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
