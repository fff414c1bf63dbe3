//! The reconciliation engine.
//!
//! A run starts at the source root and the collection root, both opened relative
//! to the current working directory. From there [`walker`] opens each directory
//! pair relative to its parent and hands it to one of the three operations:
//!
//! - [`Operation::Add`] creates missing links and directories
//! - [`Operation::Remove`] deletes managed links and the directories left empty
//! - [`Operation::Refresh`] does both, driven by the difference of the two listings
//!
//! Per-entry problems never abort the walk. They are logged and folded into the
//! [`ResultFlags`] returned from every level.

mod add;
mod classify;
mod flags;
mod refresh;
mod remove;
mod state;
mod walker;

use anyhow::{Context, Result};
use rustix::fs::CWD;
use std::ffi::CString;
use std::path::Path;

pub use flags::ResultFlags;
pub use state::{CollectionPath, Depth, SourcePath, TraversalState};
pub use walker::SideRequest;

use crate::output::Logger;
use crate::utils::buffers::PathBuffer;
use walker::{CollectionTarget, descend};

/// The three things symdir can do to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create missing links and directories.
    Add,
    /// Delete managed links and directories that end up empty.
    Remove,
    /// Make the collection match the source tree.
    Refresh,
}

impl Operation {
    /// Command name, as used on the command line and in the run banner.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Refresh => "refresh",
        }
    }

    /// Word joining source and collection in the run banner.
    #[must_use]
    pub const fn preposition(self) -> &'static str {
        match self {
            Self::Add => "to",
            Self::Remove => "from",
            Self::Refresh => "in",
        }
    }

    pub(crate) const fn source_request(self) -> SideRequest {
        match self {
            Self::Add | Self::Refresh => SideRequest::Listing,
            Self::Remove => SideRequest::NotNeeded,
        }
    }

    pub(crate) const fn collection_request(self) -> SideRequest {
        match self {
            Self::Add => SideRequest::PathOnly,
            Self::Remove | Self::Refresh => SideRequest::Listing,
        }
    }
}

/// Runs `operation` from the source directory `root` into `collection`.
///
/// `root` must hold the absolute, normalized source root (see
/// [`resolve_source_root`](crate::utils::paths::resolve_source_root)).
/// Without a collection the current directory is used and collection paths are
/// printed relative to it.
///
/// # Errors
///
/// Only fatal conditions are errors: a root that cannot be passed to the
/// kernel. Everything that goes wrong below the root is reported through
/// `logger` and the returned flags.
pub fn run(
    operation: Operation,
    root: PathBuffer,
    collection: Option<&Path>,
    depth: Depth,
    logger: &dyn Logger,
) -> Result<ResultFlags> {
    let name = CString::new(root.as_bytes())
        .with_context(|| format!("Invalid source path {}", root.display_path().display()))?;
    let mut state = TraversalState::new(root, collection, logger);

    let source_parent = match operation.source_request() {
        SideRequest::NotNeeded => None,
        SideRequest::Listing | SideRequest::PathOnly => Some(CWD),
    };
    let target = CollectionTarget::Root(collection.unwrap_or(Path::new(".")));

    Ok(descend(
        operation,
        source_parent,
        CWD,
        &name,
        &mut state,
        depth,
        target,
    ))
}
