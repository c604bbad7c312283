//! `log` facade backend for the smoke harness.
//!
//! Records go to stderr as `[<timestamp>]  <target>: <message>` so that stdout
//! stays reserved for the report. A user handler can observe records as well.

use chrono::{SecondsFormat, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, LazyLock, RwLock};

static GLOBAL_LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);
static USER_HANDLER: LazyLock<RwLock<Option<UserHandler>>> = LazyLock::new(|| RwLock::new(None));
static LOGGER: SmokeLogger = SmokeLogger;

pub type LogCallback = Arc<dyn Fn(LogCallbackParams) + Send + Sync + 'static>;

struct UserHandler {
    callback: LogCallback,
    level: Option<LogLevel>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Verbose = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Silent = 5,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Silent => "silent",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Verbose,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Silent,
        }
    }

    /// `log` has no "verbose": `debug!` records count as verbose and
    /// `trace!` records as debug.
    pub fn from_record_level(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug => LogLevel::Verbose,
            log::Level::Trace => LogLevel::Debug,
        }
    }

    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Trace,
            LogLevel::Verbose => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Silent => log::LevelFilter::Off,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Verbose => "VERBOSE",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Silent => "SILENT",
        };
        f.write_str(label)
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "verbose" => Ok(LogLevel::Verbose),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "silent" | "off" => Ok(LogLevel::Silent),
            other => Err(LogError::InvalidLogLevel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LogError {
    InvalidLogLevel(String),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::InvalidLogLevel(level) => {
                write!(f, "Invalid value \"{level}\" assigned to log level")
            }
        }
    }
}

impl std::error::Error for LogError {}

#[derive(Debug, Clone)]
pub struct LogCallbackParams {
    pub level: LogLevel,
    pub message: String,
    pub target: String,
}

impl LogCallbackParams {
    pub fn level_label(&self) -> &'static str {
        self.level.as_str()
    }
}

struct SmokeLogger;

impl log::Log for SmokeLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        LogLevel::from_record_level(metadata.level()) >= log_level()
            || user_handler_wants(LogLevel::from_record_level(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        let level = LogLevel::from_record_level(record.level());
        let message = record.args().to_string();

        if let Ok(guard) = USER_HANDLER.read() {
            if let Some(handler) = guard.as_ref() {
                if level >= handler.level.unwrap_or_else(log_level) {
                    (handler.callback)(LogCallbackParams {
                        level,
                        message: message.clone(),
                        target: record.target().to_string(),
                    });
                }
            }
        }

        if level >= log_level() && level != LogLevel::Silent {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            eprintln!("[{now}]  {}: {message}", record.target());
        }
    }

    fn flush(&self) {}
}

fn user_handler_wants(level: LogLevel) -> bool {
    USER_HANDLER
        .read()
        .map(|guard| {
            guard
                .as_ref()
                .is_some_and(|handler| level >= handler.level.unwrap_or_else(log_level))
        })
        .unwrap_or(false)
}

fn sync_max_level() {
    let mut threshold = log_level();
    if let Ok(guard) = USER_HANDLER.read() {
        if let Some(custom) = guard.as_ref().and_then(|handler| handler.level) {
            threshold = threshold.min(custom);
        }
    }
    log::set_max_level(threshold.to_level_filter());
}

/// Installs the backend (first call only) and sets the level.
pub fn init(level: LogLevel) {
    if log::set_logger(&LOGGER).is_err() {
        log::debug!("logger already installed; only updating the level");
    }
    GLOBAL_LOG_LEVEL.store(level as u8, Ordering::SeqCst);
    sync_max_level();
}

pub fn log_level() -> LogLevel {
    LogLevel::from_u8(GLOBAL_LOG_LEVEL.load(Ordering::SeqCst))
}

pub fn set_log_level<L>(level: L) -> Result<(), LogError>
where
    L: IntoLogLevel,
{
    let level = level.into_log_level()?;
    GLOBAL_LOG_LEVEL.store(level as u8, Ordering::SeqCst);
    sync_max_level();
    Ok(())
}

pub trait IntoLogLevel {
    fn into_log_level(self) -> Result<LogLevel, LogError>;
}

impl IntoLogLevel for LogLevel {
    fn into_log_level(self) -> Result<LogLevel, LogError> {
        Ok(self)
    }
}

impl IntoLogLevel for &str {
    fn into_log_level(self) -> Result<LogLevel, LogError> {
        LogLevel::from_str(self)
    }
}

impl IntoLogLevel for String {
    fn into_log_level(self) -> Result<LogLevel, LogError> {
        LogLevel::from_str(&self)
    }
}

/// Registers (or with `None`, removes) a callback that sees every record at
/// or above `level`, defaulting to the global level.
pub fn set_user_log_handler(callback: Option<LogCallback>, level: Option<LogLevel>) {
    if let Ok(mut guard) = USER_HANDLER.write() {
        *guard = callback.map(|callback| UserHandler { callback, level });
    }
    sync_max_level();
}

pub fn set_user_log_handler_fn<F>(callback: Option<F>, level: Option<LogLevel>)
where
    F: Fn(LogCallbackParams) + Send + Sync + 'static,
{
    set_user_log_handler(callback.map(|cb| Arc::new(cb) as LogCallback), level);
}
