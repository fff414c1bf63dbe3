use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::output::Logger;
use crate::utils::buffers::{LinkBuffer, PathBuffer};
use crate::utils::bytes_to_path;

/// How many directory levels below the current one may still be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    /// No limit.
    #[default]
    Unlimited,
    /// At most this many more levels.
    Levels(u32),
}

impl Depth {
    /// Whether directories at this level must be left alone.
    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        matches!(self, Self::Levels(0))
    }

    /// The depth one level further down.
    #[must_use]
    pub const fn deeper(self) -> Self {
        match self {
            Self::Levels(levels) => Self::Levels(levels.saturating_sub(1)),
            Self::Unlimited => Self::Unlimited,
        }
    }
}

impl From<Option<u32>> for Depth {
    fn from(levels: Option<u32>) -> Self {
        levels.map_or(Self::Unlimited, Self::Levels)
    }
}

/// Mutable context threaded through one whole walk.
///
/// `path` always holds the absolute source-side path of the directory being
/// visited. It grows before each descent and is cut back right after, so every
/// frame sees exactly its own path.
pub struct TraversalState<'a> {
    collection: Option<&'a Path>,
    pub(crate) path: PathBuffer,
    pub(crate) link: LinkBuffer,
    pub(crate) logger: &'a dyn Logger,
}

impl<'a> TraversalState<'a> {
    /// Starts a walk at `root`, which must already be absolute and normalized.
    ///
    /// `collection` is only used to prefix collection paths in messages.
    pub fn new(root: PathBuffer, collection: Option<&'a Path>, logger: &'a dyn Logger) -> Self {
        Self {
            collection,
            path: root,
            link: LinkBuffer::new(),
            logger,
        }
    }

    /// The current source-side path.
    #[must_use]
    pub fn path(&self) -> &PathBuffer {
        &self.path
    }

    /// Renders `<source dir>/<name>`.
    #[must_use]
    pub fn source_path<'s>(&'s self, name: Option<&'s [u8]>) -> SourcePath<'s> {
        SourcePath {
            dir: self.path.as_bytes(),
            name,
        }
    }

    /// Renders `<collection>/<relative dir>/<name>`, or `.` when all are empty.
    #[must_use]
    pub fn collection_path<'s>(&'s self, name: Option<&'s [u8]>) -> CollectionPath<'s> {
        CollectionPath {
            collection: self.collection.map(|c| c.as_os_str().as_bytes()),
            relative: self.path.relative(),
            name,
        }
    }

    /// The most recently read symlink target.
    #[must_use]
    pub fn link_target(&self) -> &Path {
        self.link.display_target()
    }
}

/// Display adapter for a path in the source tree.
#[derive(Debug, Clone, Copy)]
pub struct SourcePath<'s> {
    dir: &'s [u8],
    name: Option<&'s [u8]>,
}

impl fmt::Display for SourcePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bytes_to_path(self.dir).display())?;
        if let Some(name) = self.name {
            if self.dir.last() != Some(&b'/') {
                f.write_str("/")?;
            }
            write!(f, "{}", bytes_to_path(name).display())?;
        }
        Ok(())
    }
}

/// Display adapter for a path in the collection, relative to where the walk started.
#[derive(Debug, Clone, Copy)]
pub struct CollectionPath<'s> {
    collection: Option<&'s [u8]>,
    relative: &'s [u8],
    name: Option<&'s [u8]>,
}

impl fmt::Display for CollectionPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relative = Some(self.relative).filter(|r| !r.is_empty());
        let mut first = true;
        for part in [self.collection, relative, self.name].into_iter().flatten() {
            if !first {
                f.write_str("/")?;
            }
            write!(f, "{}", bytes_to_path(part).display())?;
            first = false;
        }
        if first {
            f.write_str(".")?;
        }
        Ok(())
    }
}
