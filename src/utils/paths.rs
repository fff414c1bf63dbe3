use anyhow::{Context, Result};
use rustix::fs::{Mode, OFlags};
use serde::{Deserialize, Serialize};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use super::buffers::PathBuffer;

/// How the source root is turned into its canonical absolute form.
///
/// The two strategies can disagree when the path crosses symlinks:
/// `/a/link/..` is `/a` lexically but the parent of the link target physically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeStrategy {
    /// Collapse `.`, `..` and repeated separators without touching the filesystem.
    #[default]
    Lexical,
    /// Change into the directory and ask the kernel for the working directory.
    Physical,
}

/// Normalizes a path purely lexically.
///
/// Runs of separators collapse, `.` segments vanish and `..` pops the previous
/// segment. A leading `..` is kept for relative paths and dropped for absolute
/// ones. Exactly two leading separators are preserved (POSIX leaves `//`
/// implementation-defined); one or three-plus collapse to `/`. An empty result
/// becomes `.` for relative input.
///
/// # Examples
///
/// ```
/// use symdir::utils::paths::normalize_path;
///
/// assert_eq!(normalize_path(b"a/./b/../c"), b"a/c");
/// assert_eq!(normalize_path(b"../x/.."), b"..");
/// assert_eq!(normalize_path(b"/../x"), b"/x");
/// assert_eq!(normalize_path(b"//x"), b"//x");
/// assert_eq!(normalize_path(b"a/.."), b".");
/// ```
#[must_use]
pub fn normalize_path(path: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(path.len() + 1);
    let mut rest = path;

    let absolute = rest.first() == Some(&b'/');
    if absolute {
        out.push(b'/');
        rest = &rest[1..];
        if rest.first() == Some(&b'/') && rest.get(1) != Some(&b'/') {
            out.push(b'/');
            rest = &rest[1..];
        }
    }

    let start = out.len();
    // Nothing below `floor` can be popped: the root or a run of leading `../`.
    let mut floor = start;
    for segment in rest.split(|&b| b == b'/') {
        match segment {
            b"" | b"." => {}
            b".." if out.len() == floor => {
                if !absolute {
                    out.extend_from_slice(b"../");
                    floor = out.len();
                }
            }
            b".." => {
                let name = &out[floor..out.len() - 1];
                let cut = name
                    .iter()
                    .rposition(|&b| b == b'/')
                    .map_or(floor, |slash| floor + slash + 1);
                out.truncate(cut);
            }
            name => {
                out.extend_from_slice(name);
                out.push(b'/');
            }
        }
    }

    if out.len() == start {
        if !absolute {
            out.push(b'.');
        }
    } else if out.len() > start && out.last() == Some(&b'/') {
        out.pop();
    }
    out
}

/// Reports whether `path` is already in the form [`normalize_path`] produces.
///
/// Used to tell structurally sound symlink targets from garbage without
/// rewriting them.
#[must_use]
pub fn is_normalized_path(path: &[u8]) -> bool {
    let leading = path.iter().take_while(|&&b| b == b'/').count();
    if leading > 2 {
        return false;
    }
    let absolute = leading > 0;
    let rest = &path[leading..];

    if rest.is_empty() {
        return absolute;
    }
    if rest == b"." {
        return !absolute;
    }

    let mut named = false;
    for segment in rest.split(|&b| b == b'/') {
        match segment {
            b"" | b"." => return false,
            b".." if absolute || named => return false,
            b".." => {}
            _ => named = true,
        }
    }
    true
}

/// Resolves `path` through the filesystem by entering it and reading back the
/// working directory. The original working directory is restored before
/// returning, also on failure.
///
/// # Errors
///
/// Returns an error if `path` cannot be entered, the working directory cannot be
/// read, or the original directory cannot be re-entered.
pub fn physical_path(path: &Path) -> io::Result<Vec<u8>> {
    let origin = rustix::fs::open(
        ".",
        OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC,
        Mode::empty(),
    )?;

    let resolved = std::env::set_current_dir(path).and_then(|()| {
        let mut buffer = PathBuffer::new();
        buffer.load_cwd()?;
        Ok(buffer.as_bytes().to_vec())
    });

    rustix::process::fchdir(&origin)?;
    resolved
}

/// Builds the canonical absolute source root for a traversal.
///
/// Relative input is anchored at the current working directory first when the
/// lexical strategy is used; the physical strategy resolves it directly.
///
/// # Errors
///
/// Returns an error if the working directory cannot be determined, the physical
/// lookup fails, or the buffer cannot grow.
pub fn resolve_source_root(dir: &Path, strategy: NormalizeStrategy) -> Result<PathBuffer> {
    let bytes = dir.as_os_str().as_bytes();
    let normalized = match strategy {
        NormalizeStrategy::Lexical if bytes.first() == Some(&b'/') => normalize_path(bytes),
        NormalizeStrategy::Lexical => {
            let mut anchored = PathBuffer::new();
            anchored
                .load_cwd()
                .context("Failed to determine the current directory")?;
            anchored
                .push(bytes)
                .context("Failed to allocate the path buffer")?;
            normalize_path(anchored.as_bytes())
        }
        NormalizeStrategy::Physical => physical_path(dir)
            .with_context(|| format!("Failed to resolve {}", dir.display()))?,
    };

    let mut root = PathBuffer::new();
    root.set_root(&normalized)
        .context("Failed to allocate the path buffer")?;
    Ok(root)
}
