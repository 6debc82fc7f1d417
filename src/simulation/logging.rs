//! Diagnostic logging for generation runs
//!
//! Generated events may be written to stdout, so diagnostics only ever go to
//! stderr and, when requested, to a log file.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::types::config::CliArgs;

/// Target of every event this crate emits
pub const LOG_TARGET: &str = "pump_data_faker";

/// Failure to set up the global subscriber
pub type LoggingError = Box<dyn std::error::Error + Send + Sync>;

/// How much a run reports about itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    /// Stage summaries and per-run totals
    Verbose,
    /// Per-interval delivery decisions, plus stage timings
    Debug,
}

impl Verbosity {
    /// `--debug` wins over `--verbose`
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        match (verbose, debug) {
            (_, true) => Verbosity::Debug,
            (true, false) => Verbosity::Verbose,
            (false, false) => Verbosity::Quiet,
        }
    }

    pub fn level(self) -> Level {
        match self {
            Verbosity::Quiet => Level::WARN,
            Verbosity::Verbose => Level::INFO,
            Verbosity::Debug => Level::DEBUG,
        }
    }

    /// Stage spans report their elapsed time when they close, at debug only
    fn span_events(self) -> FmtSpan {
        match self {
            Verbosity::Debug => FmtSpan::CLOSE,
            _ => FmtSpan::NONE,
        }
    }
}

/// Where and how run diagnostics are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub verbosity: Verbosity,
    /// JSON lines on stderr instead of pretty text
    pub json_console: bool,
    /// Also append JSON diagnostics to this file
    pub log_file: Option<PathBuf>,
}

/// Keeps the log file writer alive; drop it to flush
#[derive(Debug, Default)]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingConfig {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity, json_console: false, log_file: None }
    }

    /// Logging requested on the command line
    pub fn from_cli_args(args: &CliArgs) -> Self {
        let config = Self::new(Verbosity::from_flags(args.verbose, args.debug))
            .with_json_console(args.log_json);
        match &args.log_file {
            Some(path) => config.with_log_file(path),
            None => config,
        }
    }

    pub fn with_json_console(mut self, json: bool) -> Self {
        self.json_console = json;
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Filter used when `RUST_LOG` is unset: this crate at the verbosity level,
    /// everything else off
    pub fn default_directive(&self) -> String {
        format!("{}={}", LOG_TARGET, self.verbosity.level())
    }

    fn build_filter(&self) -> Result<EnvFilter, LoggingError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => Ok(EnvFilter::try_new(self.default_directive())?),
        }
    }

    /// Install the global subscriber.
    ///
    /// The log file, if any, is opened for append and always gets JSON. Keep the
    /// returned guard alive until the run's output has been written.
    pub fn init(self) -> Result<LoggingGuard, LoggingError> {
        let filter = self.build_filter()?;
        let spans = self.verbosity.span_events();

        let (file_layer, file_guard) = match &self.log_file {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                let (writer, guard) = non_blocking(file);
                let layer = fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_span_events(spans.clone());
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        let json_console = self
            .json_console
            .then(|| fmt::layer().json().with_writer(io::stderr).with_span_events(spans.clone()));
        let text_console = (!self.json_console)
            .then(|| fmt::layer().pretty().with_writer(io::stderr).with_span_events(spans));

        Registry::default()
            .with(filter)
            .with(file_layer)
            .with(json_console)
            .with(text_console)
            .try_init()?;

        debug!(verbosity = ?self.verbosity, log_file = ?self.log_file, "Logging initialized");
        Ok(LoggingGuard { _file_guard: file_guard })
    }
}

/// Structured event tagged with the generation stage that emitted it
#[macro_export]
macro_rules! stage_event {
    ($level:ident, $stage:literal, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::$level!(
            message = $message,
            stage = $stage,
            $($key = $value,)*
        )
    };
}

/// Span covering one generation stage
#[macro_export]
macro_rules! stage_span {
    ($stage:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info_span!(
            "stage",
            stage = $stage,
            $($key = $value,)*
        )
    };
}
