//! Utility functions and helpers.
//!
//! - [`paths`]: lexical and physical path normalization
//! - [`buffers`]: the growing path and symlink-target buffers used during traversal
//!
//! # Examples
//!
//! ```
//! use symdir::utils::paths::{is_normalized_path, normalize_path};
//!
//! let normalized = normalize_path(b"/srv//music/./../films/");
//! assert_eq!(normalized, b"/srv/films");
//! assert!(is_normalized_path(&normalized));
//! ```

/// Growing buffers for the current path and the last symlink target
pub mod buffers;
/// Path normalization and source-root resolution
pub mod paths;

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Views raw path bytes as a [`Path`], mainly for display.
#[must_use]
pub fn bytes_to_path(bytes: &[u8]) -> &Path {
    Path::new(OsStr::from_bytes(bytes))
}

/// Renders a syscall error the way `strerror` would, plus the OS error code.
#[must_use]
pub fn describe_errno(err: rustix::io::Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(err.raw_os_error())
}
