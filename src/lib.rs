#![warn(missing_docs)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Buffer lengths are bounded by allocation size
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # symdir - Manage a directory full of symlinks
//!
//! symdir maintains a *collection* directory tree whose regular entries are
//! symbolic links pointing into a separate *source* tree, mirroring the source
//! tree's directory structure.
//!
//! ## Operations
//!
//! - **add**: create the links and directories that are missing
//! - **remove**: delete links (and directories left empty) that point into the source tree
//! - **refresh**: reconcile the collection to exactly match the current source tree
//!
//! Anything in the collection that symdir did not create (foreign links, regular
//! files, directories holding such entries) is never touched.
//!
//! ## Architecture
//!
//! - [`engine`]: the file-descriptor-relative tree walker, the entry classifier and
//!   the three reconciliation operations
//! - [`utils`]: path normalization and the growing path/link buffers
//! - [`output`]: the logging collaborator injected into the engine
//! - [`config`]: configuration file handling
//! - [`commands`]: glue between resolved settings and the engine
//! - [`cli`]: command-line definitions
//!
//! ## Example Usage
//!
//! ```no_run
//! use symdir::commands::{self, Request};
//! use symdir::engine::{Depth, Operation};
//! use symdir::output::{ConsoleLogger, Verbosity};
//! use symdir::utils::paths::NormalizeStrategy;
//!
//! # fn main() -> anyhow::Result<()> {
//! let request = Request {
//!     operation: Operation::Add,
//!     source: "/srv/music".into(),
//!     collection: Some("/home/me/music".into()),
//!     depth: Depth::Unlimited,
//!     normalize: NormalizeStrategy::Lexical,
//! };
//! let logger = ConsoleLogger::new("symdir", Verbosity::Info);
//! let flags = commands::execute(&request, &logger)?;
//! assert!(!flags.is_failure());
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Entry points that turn resolved settings into an engine run.
pub mod commands;

/// Configuration parsing and validation.
pub mod config;

/// Directory-tree synchronization engine.
pub mod engine;

/// User-facing log output.
pub mod output;

/// Path normalization and buffer management.
pub mod utils;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::commands::Request;
use crate::config::Config;
use crate::engine::{Depth, Operation};
use crate::output::Verbosity;
use crate::utils::paths::NormalizeStrategy;

/// Current version of the symdir binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Growth increment, in bytes, of the path and link buffers.
pub const CHUNK_SIZE: usize = 4096;

/// Configuration file path relative to the platform configuration directory.
pub const DEFAULT_CONFIG_PATH: &str = "symdir/config.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "SYMDIR_CONFIG";

/// Environment variable holding the `tracing` filter for diagnostics.
pub const LOG_ENV: &str = "SYMDIR_LOG";

/// Settings shared by every symdir invocation.
///
/// Holds the loaded configuration and knows how to merge it with
/// command-line overrides into a [`Request`].
#[derive(Debug, Clone)]
pub struct SymdirContext {
    /// Where the configuration was looked up, if anywhere.
    pub config_path: Option<PathBuf>,

    /// Loaded configuration settings.
    pub config: Config,
}

impl SymdirContext {
    /// Creates a context from `$SYMDIR_CONFIG` or the default configuration path.
    ///
    /// # Errors
    /// Returns an error if the configuration file exists but cannot be read,
    /// parsed, or validated.
    pub fn new() -> Result<Self> {
        let config_path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => dirs::config_dir().map(|dir| dir.join(DEFAULT_CONFIG_PATH)),
        };

        match config_path {
            Some(path) => Self::new_explicit(path),
            None => Ok(Self {
                config_path: None,
                config: Config::default(),
            }),
        }
    }

    /// Creates a context from an explicit configuration file path.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    /// Returns an error if the file exists but is not valid configuration.
    pub fn new_explicit(config_path: PathBuf) -> Result<Self> {
        let config = Config::load(&config_path)?;
        Ok(Self {
            config_path: Some(config_path),
            config,
        })
    }

    /// Verbosity after applying `extra` levels from `-v` flags on top of the configured base.
    #[must_use]
    pub fn verbosity(&self, extra: u8) -> Verbosity {
        Verbosity::from_count(self.config.verbosity.saturating_add(extra))
    }

    /// Merges command-line values with the configuration into a run request.
    ///
    /// Command-line values win; unset values fall back to the configuration,
    /// then to the built-in defaults (collection `.`, unlimited depth, lexical
    /// normalization).
    #[must_use]
    pub fn request(
        &self,
        operation: Operation,
        source: &Path,
        collection: Option<PathBuf>,
        depth: Option<u32>,
        normalize: Option<NormalizeStrategy>,
    ) -> Request {
        let depth = match operation {
            Operation::Remove => Depth::Unlimited,
            Operation::Add | Operation::Refresh => depth.or(self.config.depth).into(),
        };

        Request {
            operation,
            source: source.to_path_buf(),
            collection: collection.or_else(|| self.config.collection.clone()),
            depth,
            normalize: normalize.unwrap_or(self.config.normalize),
        }
    }
}

impl Default for SymdirContext {
    fn default() -> Self {
        Self {
            config_path: None,
            config: Config::default(),
        }
    }
}
