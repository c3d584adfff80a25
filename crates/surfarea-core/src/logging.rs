//! Process-wide verbosity and diagnostic output.
//!
//! Diagnostics are emitted with `tracing` macros. The verbosity level stored here is the
//! single switch that decides which of them reach the output: [`init_logging`] installs a
//! subscriber whose filter consults [`verbosity`] for every event, so changing the level
//! takes effect immediately.
//!
//! The level is meant to be set before a call and restored afterwards; [`VerbosityGuard`]
//! does exactly that and is what the structure builder uses for its per-call override.

use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;
use tracing::{Level, Metadata};
use tracing_subscriber::{
    filter::{LevelFilter, dynamic_filter_fn},
    fmt as tracing_fmt,
    layer::Context,
    prelude::*,
    util::TryInitError,
};

static VERBOSITY: AtomicU8 = AtomicU8::new(Verbosity::Normal as u8);

/// How much diagnostic output construction and calculation routines produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Verbosity {
    /// No output at all.
    Silent = 0,
    /// Errors only.
    NoWarnings = 1,
    /// Errors and warnings.
    #[default]
    Normal = 2,
    /// Everything, including debug traces.
    Debug = 3,
}

impl Verbosity {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Verbosity::Silent,
            1 => Verbosity::NoWarnings,
            2 => Verbosity::Normal,
            _ => Verbosity::Debug,
        }
    }

    /// The most verbose `tracing` level this verbosity lets through.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Silent => LevelFilter::OFF,
            Verbosity::NoWarnings => LevelFilter::ERROR,
            Verbosity::Normal => LevelFilter::WARN,
            Verbosity::Debug => LevelFilter::TRACE,
        }
    }

    pub fn allows(self, level: &Level) -> bool {
        *level <= self.level_filter()
    }
}

impl FromStr for Verbosity {
    type Err = ParseVerbosityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(Verbosity::Silent),
            "nowarnings" | "no-warnings" => Ok(Verbosity::NoWarnings),
            "normal" => Ok(Verbosity::Normal),
            "debug" => Ok(Verbosity::Debug),
            _ => Err(ParseVerbosityError(s.to_string())),
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Verbosity::Silent => "silent",
                Verbosity::NoWarnings => "nowarnings",
                Verbosity::Normal => "normal",
                Verbosity::Debug => "debug",
            }
        )
    }
}

#[derive(Debug, Error)]
#[error("Invalid verbosity '{0}' (expected silent, nowarnings, normal or debug)")]
pub struct ParseVerbosityError(String);

/// Returns the current process-wide verbosity.
pub fn verbosity() -> Verbosity {
    Verbosity::from_u8(VERBOSITY.load(Ordering::Relaxed))
}

/// Sets the process-wide verbosity.
pub fn set_verbosity(verbosity: Verbosity) {
    VERBOSITY.store(verbosity as u8, Ordering::Relaxed);
}

/// Overrides the verbosity until dropped, then restores the previous level.
#[must_use = "the previous verbosity is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct VerbosityGuard {
    previous: Verbosity,
}

impl VerbosityGuard {
    pub fn set(verbosity: Verbosity) -> Self {
        let previous = self::verbosity();
        set_verbosity(verbosity);
        Self { previous }
    }

    pub fn previous(&self) -> Verbosity {
        self.previous
    }
}

impl Drop for VerbosityGuard {
    fn drop(&mut self) {
        set_verbosity(self.previous);
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to install the global subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Checked on every event, never cached per call site, so level changes apply at once.
fn verbosity_allows<S>(metadata: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
    verbosity().allows(metadata.level())
}

/// Installs a global subscriber that writes compact diagnostics to stderr, and optionally
/// a plain-text copy to `log_file`, both gated by the process-wide verbosity.
pub fn init_logging(log_file: Option<&Path>) -> Result<(), LoggingError> {
    let stderr_layer = tracing_fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(dynamic_filter_fn(verbosity_allows));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            Some(
                tracing_fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(dynamic_filter_fn(verbosity_allows)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}
