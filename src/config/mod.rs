use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::paths::NormalizeStrategy;

/// Highest accepted verbosity level.
pub const MAX_VERBOSITY: u8 = 2;

/// Settings read from `config.toml`.
///
/// Every key is optional; command-line flags override whatever is set here.
///
/// ```toml
/// collection = "/home/me/music"
/// depth = 2
/// verbosity = 1
/// normalize = "physical"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Collection directory used when `--collection` is not given.
    pub collection: Option<PathBuf>,

    /// Recursion limit for `add` and `refresh`; unlimited when unset.
    pub depth: Option<u32>,

    /// Base verbosity, raised further by each `-v`.
    pub verbosity: u8,

    /// How the source directory is made absolute.
    pub normalize: NormalizeStrategy,
}

impl Config {
    /// Loads the configuration at `path`.
    ///
    /// A missing file is not an error and yields the defaults. The file is never
    /// created.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, is not valid TOML,
    /// or holds out-of-range values.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read config file: {}", path.display()));
            }
        };
        Self::parse(&text).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML, unknown keys or out-of-range values.
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.verbosity > MAX_VERBOSITY {
            bail!(
                "verbosity must be between 0 and {MAX_VERBOSITY}, got {}",
                self.verbosity
            );
        }
        if let Some(depth) = self.depth {
            if i32::try_from(depth).is_err() {
                bail!("depth must not exceed {}, got {depth}", i32::MAX);
            }
        }
        if self
            .collection
            .as_ref()
            .is_some_and(|c| c.as_os_str().is_empty())
        {
            bail!("collection must not be empty");
        }
        Ok(())
    }
}
