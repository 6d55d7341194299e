//! Logger initialisation
//!
//! Log lines go to two places: the session log file, which receives everything down to the
//! chosen file level, and stderr, which gets a coloured copy filtered at the console level. Stdout
//! is left free for command responses.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info, Level, Record};
use std::fmt;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The log file must record at least `INFO`, found `{0}`")]
    InvalidFileLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Notes
///
/// - `file_level` must be `Info` or more verbose, the console may be quieter.
/// - The line editor's own logging is capped at `Info`.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    file_level: LevelFilter,
    console_level: LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if file_level < Level::Info {
        return Err(LoggerInitError::InvalidFileLevel(file_level));
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}",
                session::get_elapsed_seconds(),
                level_tag(record.level()),
                Body(message, record)
            ))
        })
        .level(file_level)
        .chain(log_file);

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}",
                session::get_elapsed_seconds(),
                coloured_level_tag(record.level()),
                Body(message, record)
            ))
        })
        .level(console_level)
        .chain(std::io::stderr());

    fern::Dispatch::new()
        .level(file_level.max(console_level))
        .level_for("rustyline", LevelFilter::Info)
        .chain(file)
        .chain(console)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    File log level: {:?}", file_level);
    info!("    Console log level: {:?}", console_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE ITEMS
// ---------------------------------------------------------------------------

/// Message of a record, prefixed by its target for debug and trace records.
struct Body<'a, 'r>(&'a fmt::Arguments<'a>, &'a Record<'r>);

impl fmt::Display for Body<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.1.level() > Level::Info {
            write!(f, "{}: {}", self.1.target(), self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Three letter tag for a log level
fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

fn coloured_level_tag(level: Level) -> ColoredString {
    let tag = level_tag(level);
    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info => tag.normal(),
        Level::Warn => tag.yellow(),
        Level::Error => tag.red().bold(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_body_includes_target_below_info() {
        let debug = Record::builder()
            .args(format_args!("hello 1"))
            .level(Level::Debug)
            .target("arm_lib::link")
            .build();
        assert_eq!(
            Body(debug.args(), &debug).to_string(),
            "arm_lib::link: hello 1"
        );

        let warn = Record::builder()
            .args(format_args!("hello 1"))
            .level(Level::Warn)
            .target("arm_lib::link")
            .build();
        assert_eq!(Body(warn.args(), &warn).to_string(), "hello 1");
    }

    #[test]
    fn test_level_tags() {
        assert_eq!(level_tag(Level::Trace), "TRC");
        assert_eq!(level_tag(Level::Error), "ERR");
    }
}
