//! Tracing subscriber setup: console formatter, file layer, and initialisation.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use super::memory::LogEntry;
use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// Target used for stage headers.
pub(super) const STAGE_TARGET: &str = "bootstrap::stage";

/// Target used for dry-run transcript lines.
pub(super) const DRY_RUN_TARGET: &str = "bootstrap::dry_run";

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// A [`tracing_subscriber::Layer`] that appends all events to the persistent
/// log file with timestamps and ANSI codes stripped.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log file for `command`, write a run header, and return a
    /// layer appending to it. `None` if the cache directory is unusable.
    pub(super) fn new(command: &str) -> Option<Self> {
        Self::create(&log_file_path(command)?)
    }

    /// Same as [`new`](Self::new) with an explicit path.
    pub(super) fn create(path: &Path) -> Option<Self> {
        let version = option_env!("BOOTSTRAP_VERSION")
            .unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let header = format!(
            "==========================================\n\
             Bootstrap {version} {}\n\
             ==========================================\n",
            format_utc_datetime(),
        );
        fs::write(path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let line = file_line(&classify(event), &format_utc_time());
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// Map a tracing event back onto the [`Log`](super::Log) method that emitted it.
///
/// Stage headers and dry-run lines are `INFO` events told apart by target.
fn classify(event: &tracing::Event<'_>) -> LogEntry {
    let mut extractor = MessageExtractor::default();
    event.record(&mut extractor);
    let metadata = event.metadata();
    entry_for(*metadata.level(), metadata.target(), extractor.message)
}

fn entry_for(level: tracing::Level, target: &str, message: String) -> LogEntry {
    match level {
        tracing::Level::ERROR => LogEntry::Error(message),
        tracing::Level::WARN => LogEntry::Warn(message),
        tracing::Level::INFO if target == STAGE_TARGET => LogEntry::Stage(message),
        tracing::Level::INFO if target == DRY_RUN_TARGET => LogEntry::DryRun(message),
        tracing::Level::INFO => LogEntry::Info(message),
        _ => LogEntry::Debug(message),
    }
}

/// Console rendering, with colour.
fn console_line(entry: &LogEntry) -> String {
    match entry {
        LogEntry::Error(m) => format!("\x1b[31mERROR\x1b[0m {m}"),
        LogEntry::Warn(m) => format!("\x1b[33mWARN\x1b[0m  {m}"),
        LogEntry::Stage(m) => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{m}\x1b[0m"),
        LogEntry::DryRun(m) => format!("  \x1b[33m[DRY RUN]\x1b[0m {m}"),
        LogEntry::Info(m) => format!("  {m}"),
        LogEntry::Debug(m) => format!("  \x1b[2m{m}\x1b[0m"),
    }
}

/// Log file rendering: timestamped, no ANSI codes.
fn file_line(entry: &LogEntry, ts: &str) -> String {
    let msg = strip_ansi(entry.message());
    match entry {
        LogEntry::Stage(_) => format!("[{ts}] ==> {msg}"),
        LogEntry::DryRun(_) => format!("[{ts}]     [dry run] {msg}"),
        LogEntry::Error(_) => format!("[{ts}]     [error] {msg}"),
        LogEntry::Warn(_) => format!("[{ts}]     [warn] {msg}"),
        LogEntry::Debug(_) => format!("[{ts}]     [debug] {msg}"),
        LogEntry::Info(_) => format!("[{ts}]     {msg}"),
    }
}

/// Console [`FormatEvent`](tracing_subscriber::fmt::FormatEvent) built on
/// [`console_line`].
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        writeln!(writer, "{}", console_line(&classify(event)))
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Console output goes to stdout (info and below) and stderr (warnings and
/// errors); the file layer captures everything from `debug` up in
/// `$XDG_CACHE_HOME/bootstrap/<command>.log`. Call once, before logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(make_writer)
        .with_filter(console_level);

    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}
