//! User-facing log output for symdir.
//!
//! The engine never prints directly: it reports through a [`Logger`] handed to it
//! by the caller. [`ConsoleLogger`] produces the classic `<program>: <message>`
//! lines, [`MemoryLogger`] keeps them for inspection.
//!
//! - Info and debug lines go to stdout and are gated by [`Verbosity`]
//! - Warnings and errors go to stderr and are always shown

use colored::Colorize;
use std::cell::RefCell;
use std::fmt;
use std::io::{self, IsTerminal, Write};

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// A per-entry failure; the run will exit non-zero.
    Error,
    /// Something was left untouched that the user should look at.
    Warn,
    /// A change made to the collection.
    Info,
    /// Bookkeeping about entries that needed no change.
    Debug,
}

/// How much of the log reaches stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Only warnings and errors.
    #[default]
    Warnings = 0,
    /// Also report every change.
    Info = 1,
    /// Also report entries that were left alone.
    Debug = 2,
}

impl Verbosity {
    /// Maps a `-v` count to a level, saturating at [`Verbosity::Debug`].
    #[must_use]
    pub const fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Warnings,
            1 => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Whether lines of `level` are shown.
    #[must_use]
    pub const fn allows(self, level: Level) -> bool {
        match level {
            Level::Error | Level::Warn => true,
            Level::Info => matches!(self, Self::Info | Self::Debug),
            Level::Debug => matches!(self, Self::Debug),
        }
    }
}

/// Sink for the engine's messages.
pub trait Logger {
    /// Emits one message.
    fn log(&self, level: Level, message: fmt::Arguments<'_>);

    /// Emits a debug message.
    fn debug(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Debug, message);
    }

    /// Emits an info message.
    fn info(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Info, message);
    }

    /// Emits a warning.
    fn warn(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Warn, message);
    }

    /// Emits an error.
    fn error(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Error, message);
    }
}

/// Writes `<program>: <message>` lines to stdout and stderr.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    program: String,
    verbosity: Verbosity,
}

impl ConsoleLogger {
    /// Creates a logger prefixing every line with `program`.
    pub fn new(program: impl Into<String>, verbosity: Verbosity) -> Self {
        Self {
            program: program.into(),
            verbosity,
        }
    }

    /// The active verbosity.
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn write_line(&self, mut out: impl Write, styled: bool, message: fmt::Arguments<'_>) {
        // Output is best effort: a closed pipe must not abort the walk.
        let _ = if styled {
            writeln!(out, "{}: {}", self.program.as_str().bold(), message)
        } else {
            writeln!(out, "{}: {}", self.program, message)
        };
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        if !self.verbosity.allows(level) {
            return;
        }
        match level {
            Level::Error | Level::Warn => {
                let stderr = io::stderr();
                let styled = stderr.is_terminal();
                self.write_line(stderr.lock(), styled, message);
            }
            Level::Info | Level::Debug => {
                let stdout = io::stdout();
                let styled = stdout.is_terminal();
                self.write_line(stdout.lock(), styled, message);
            }
        }
    }
}

/// Keeps every message in memory, regardless of level.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: RefCell<Vec<(Level, String)>>,
}

impl MemoryLogger {
    /// Creates an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.borrow().clone()
    }

    /// Messages recorded at `level`.
    #[must_use]
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(recorded, _)| *recorded == level)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Whether any message at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lines
            .borrow()
            .iter()
            .any(|(recorded, message)| *recorded == level && message.contains(needle))
    }

    /// Number of lines at `level` or more severe.
    #[must_use]
    pub fn count_at_least(&self, level: Level) -> usize {
        self.lines
            .borrow()
            .iter()
            .filter(|(recorded, _)| *recorded <= level)
            .count()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        self.lines.borrow_mut().push((level, message.to_string()));
    }
}
