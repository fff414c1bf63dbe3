//! File-descriptor-relative descent into a pair of directories.
//!
//! Every directory is opened relative to its already-open parent, so the walk
//! never re-resolves long paths and never follows a symlink planted below the
//! roots. Handles are owned values: whatever path a frame takes out, both sides
//! are closed when it returns.

use rustix::fs::{Dir, Mode, OFlags, openat};
use rustix::io::Errno;
use std::ffi::CStr;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::Path;
use tracing::{Level, span, trace};

use super::classify::{collection_failure, source_failure};
use super::flags::ResultFlags;
use super::state::{Depth, TraversalState};
use super::{Operation, add, refresh, remove};
use crate::utils::describe_errno;

/// What an operation needs from one side of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideRequest {
    /// Open the directory and enumerate it.
    Listing,
    /// Open the directory only as an anchor for `*at` calls.
    PathOnly,
    /// Do not open this side at all.
    NotNeeded,
}

/// One open directory, optionally with a listing stream.
pub(crate) struct DirHandle {
    fd: OwnedFd,
    listing: Option<Dir>,
}

impl DirHandle {
    fn open(
        parent: BorrowedFd<'_>,
        name: impl rustix::path::Arg,
        request: SideRequest,
        follow: bool,
    ) -> Result<Self, Errno> {
        let mut flags = OFlags::DIRECTORY | OFlags::CLOEXEC;
        if !follow {
            flags |= OFlags::NOFOLLOW;
        }
        flags |= match request {
            #[cfg(any(target_os = "linux", target_os = "android"))]
            SideRequest::PathOnly => OFlags::PATH,
            _ => OFlags::RDONLY,
        };

        let fd = openat(parent, name, flags, Mode::empty())?;
        let listing = match request {
            SideRequest::Listing => Some(Dir::read_from(&fd)?),
            SideRequest::PathOnly | SideRequest::NotNeeded => None,
        };
        Ok(Self { fd, listing })
    }

    /// The directory descriptor.
    pub(crate) fn fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }

    /// The descriptor together with the listing, if one was requested.
    pub(crate) fn split(&mut self) -> (BorrowedFd<'_>, Option<&mut Dir>) {
        (self.fd.as_fd(), self.listing.as_mut())
    }
}

/// Both sides of one directory level.
///
/// Lives for exactly one operation call; dropping it closes both sides.
pub(crate) struct DirectoryPair {
    pub(crate) source: Option<DirHandle>,
    pub(crate) collection: DirHandle,
}

/// Where the collection side of a descent lives.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CollectionTarget<'p> {
    /// Same name as the source entry.
    SameName,
    /// The collection root; it also names the directory in messages and may be a symlink.
    Root(&'p Path),
}

/// Opens `name` in both trees and runs `operation` on the pair.
///
/// A vanished source entry is not an error: there is simply nothing to do.
/// The path buffer is extended by `name` (except at the root, where it already
/// holds the source root) and restored before returning.
pub(crate) fn descend(
    operation: Operation,
    source_parent: Option<BorrowedFd<'_>>,
    collection_parent: BorrowedFd<'_>,
    name: &CStr,
    state: &mut TraversalState<'_>,
    depth: Depth,
    target: CollectionTarget<'_>,
) -> ResultFlags {
    let mark = state.path.len();
    if matches!(target, CollectionTarget::SameName) {
        if let Err(err) = state.path.push(name.to_bytes()) {
            state.logger.error(format_args!(
                "cannot access {}: {}",
                state.source_path(Some(name.to_bytes())),
                err
            ));
            return ResultFlags::ERROR | ResultFlags::NONEMPTY;
        }
    }

    let span = span!(Level::DEBUG, "descend", op = operation.name(), path = %state.path.display_path().display());
    let _guard = span.enter();

    let flags = open_and_run(
        operation,
        source_parent,
        collection_parent,
        name,
        state,
        depth,
        target,
    );
    trace!(%flags, "leaving directory");

    state.path.truncate(mark);
    flags
}

fn open_and_run(
    operation: Operation,
    source_parent: Option<BorrowedFd<'_>>,
    collection_parent: BorrowedFd<'_>,
    name: &CStr,
    state: &mut TraversalState<'_>,
    depth: Depth,
    target: CollectionTarget<'_>,
) -> ResultFlags {
    let at_root = matches!(target, CollectionTarget::Root(_));

    let source = match (operation.source_request(), source_parent) {
        (SideRequest::NotNeeded, _) | (_, None) => None,
        (request, Some(parent)) => match DirHandle::open(parent, name, request, at_root) {
            Ok(handle) => Some(handle),
            Err(Errno::NOENT) => return ResultFlags::empty(),
            Err(err) => {
                source_failure(state, "open", None, err);
                return ResultFlags::ERROR;
            }
        },
    };

    let request = operation.collection_request();
    let collection = match target {
        CollectionTarget::SameName => DirHandle::open(collection_parent, name, request, false),
        CollectionTarget::Root(root) => DirHandle::open(collection_parent, root, request, true),
    };
    let collection = match collection {
        Ok(handle) => handle,
        Err(err) => {
            let mut flags = ResultFlags::ERROR;
            if err != Errno::NOENT {
                flags |= ResultFlags::NONEMPTY;
            }
            match target {
                CollectionTarget::Root(root) => state.logger.error(format_args!(
                    "cannot open {}: {}",
                    root.display(),
                    describe_errno(err)
                )),
                CollectionTarget::SameName => collection_failure(state, "open", None, err),
            }
            return flags;
        }
    };

    let mut pair = DirectoryPair { source, collection };
    match operation {
        Operation::Add => add::run(&mut pair, state, depth),
        Operation::Remove => remove::run(&mut pair, state),
        Operation::Refresh => refresh::run(&mut pair, state, depth),
    }
}
