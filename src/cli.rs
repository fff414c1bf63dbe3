//! Command-line interface definitions for symdir.
//!
//! The definitions are shared between the main binary and build tools (like xtask)
//! for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes and doc comments,
//! so we allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};

use crate::engine::Operation;
use crate::utils::paths::NormalizeStrategy;

/// Main CLI structure for symdir.
#[derive(Parser, Debug)]
#[command(
    name = "symdir",
    version = crate::VERSION,
    about = "Maintain a directory tree of symlinks into another tree",
    long_about = "Mirrors the directory structure of a source tree in a collection \
                  directory, with every file represented by a symlink to its source. \
                  Entries symdir did not create are never touched."
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Report changes; repeat to also report entries left alone
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Collection directory [default: .]
    #[arg(
        short,
        long,
        global = true,
        value_name = "PATH",
        env = "SYMDIR_COLLECTION"
    )]
    pub collection: Option<PathBuf>,

    /// How to make the source directory absolute
    #[arg(long, global = true, value_enum, value_name = "STRATEGY")]
    pub normalize: Option<NormalizeStrategy>,
}

/// All available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Link every file of DIR into the collection, creating directories as needed
    Add {
        /// Recursion depth limit [default: unlimited]
        #[arg(short, long, value_parser = parse_depth)]
        depth: Option<u32>,

        /// Source directory
        dir: PathBuf,
    },

    /// Make the collection match DIR: add what is missing, remove what is stale
    Refresh {
        /// Recursion depth limit [default: unlimited]
        #[arg(short, long, value_parser = parse_depth)]
        depth: Option<u32>,

        /// Source directory
        dir: PathBuf,
    },

    /// Remove links into DIR and the directories left empty
    #[command(visible_alias = "rm")]
    Remove {
        /// Source directory
        dir: PathBuf,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    /// The engine operation, source directory and depth, for the commands that walk a tree.
    #[must_use]
    pub fn operation(&self) -> Option<(Operation, &Path, Option<u32>)> {
        match self {
            Self::Add { depth, dir } => Some((Operation::Add, dir, *depth)),
            Self::Refresh { depth, dir } => Some((Operation::Refresh, dir, *depth)),
            Self::Remove { dir } => Some((Operation::Remove, dir, None)),
            Self::Completion { .. } => None,
        }
    }
}

/// Parses a depth the way `strtoul` with base 0 does.
///
/// Decimal, `0x` hexadecimal and leading-`0` octal are accepted. Values above
/// `i32::MAX` are out of range; anything left unparsed is invalid.
///
/// # Errors
///
/// Returns `cannot parse depth <arg>: <reason>`.
pub fn parse_depth(arg: &str) -> Result<u32, String> {
    const INVALID: &str = "Invalid argument";
    const RANGE: &str = "Numerical result out of range";
    let fail = |reason: &str| format!("cannot parse depth {arg}: {reason}");

    let trimmed = arg.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
        .filter(|hex| hex.starts_with(|c: char| c.is_ascii_hexdigit()))
    {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };

    if digits.is_empty() {
        // A bare sign or nothing at all parses as zero with nothing consumed.
        return if arg.is_empty() {
            Ok(0)
        } else {
            Err(fail(INVALID))
        };
    }
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(fail(INVALID));
    }

    let value = u64::from_str_radix(digits, radix).map_err(|_| fail(RANGE))?;
    if negative && value != 0 {
        return Err(fail(RANGE));
    }
    match i32::try_from(value) {
        Ok(depth) => Ok(depth.unsigned_abs()),
        Err(_) => Err(fail(RANGE)),
    }
}
