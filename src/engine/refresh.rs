use rustix::fs::{Dir, FileType};
use rustix::io::Errno;
use std::ffi::CStr;
use std::os::fd::BorrowedFd;
use tracing::{debug, trace};

use super::Operation;
use super::add::{create_entry, enter};
use super::classify::{
    Entry, classify, collection_failure, conflict, file_type_at, foreign_link, invalid_link,
    is_dot_entry, kept, occupied, skipped, source_failure,
};
use super::flags::ResultFlags;
use super::remove::{remove_dir, unlink};
use super::state::{Depth, TraversalState};
use super::walker::{DirHandle, DirectoryPair};

/// Makes one collection directory match its source directory.
///
/// The source listing is walked first to create what is missing; names that
/// exist on both sides are left for the collection pass, which cleans up and
/// recurses.
pub(crate) fn run(
    pair: &mut DirectoryPair,
    state: &mut TraversalState<'_>,
    depth: Depth,
) -> ResultFlags {
    let (collection, Some(collection_listing)) = pair.collection.split() else {
        trace!("refresh called without a collection listing");
        return ResultFlags::ERROR | ResultFlags::NONEMPTY;
    };
    let Some((source, Some(source_listing))) = pair.source.as_mut().map(DirHandle::split) else {
        trace!("refresh called without a source listing");
        return ResultFlags::ERROR | ResultFlags::NONEMPTY;
    };

    let created = create_missing(source, collection, source_listing, state, depth);
    debug!(%created, "creation pass done");
    created | clean_up(source, collection, collection_listing, state, depth)
}

fn create_missing(
    source: BorrowedFd<'_>,
    collection: BorrowedFd<'_>,
    listing: &mut Dir,
    state: &mut TraversalState<'_>,
    depth: Depth,
) -> ResultFlags {
    let mut flags = ResultFlags::empty();
    for entry in listing {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                source_failure(state, "read", None, err);
                flags |= ResultFlags::ERROR;
                break;
            }
        };
        let name = entry.file_name();
        if is_dot_entry(name) {
            continue;
        }

        match file_type_at(collection, name) {
            Ok(_) => continue,
            Err(Errno::NOENT) => {}
            Err(err) => {
                collection_failure(state, "access", Some(name), err);
                flags |= ResultFlags::ERROR | ResultFlags::NONEMPTY;
                continue;
            }
        }

        let source_type = match file_type_at(source, name) {
            Ok(file_type) => file_type,
            Err(Errno::NOENT) => continue,
            Err(err) => {
                source_failure(state, "access", Some(name), err);
                flags |= ResultFlags::ERROR;
                continue;
            }
        };
        flags |= create_entry(source, collection, name, source_type, state, depth);
    }
    flags
}

fn clean_up(
    source: BorrowedFd<'_>,
    collection: BorrowedFd<'_>,
    listing: &mut Dir,
    state: &mut TraversalState<'_>,
    depth: Depth,
) -> ResultFlags {
    let mut flags = ResultFlags::empty();
    for entry in listing {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                collection_failure(state, "read", None, err);
                flags |= ResultFlags::ERROR | ResultFlags::NONEMPTY;
                break;
            }
        };
        let name = entry.file_name();
        if is_dot_entry(name) {
            continue;
        }

        let source_type = match file_type_at(source, name) {
            Ok(file_type) => Some(file_type),
            Err(Errno::NOENT) => None,
            Err(err) => {
                source_failure(state, "access", Some(name), err);
                flags |= ResultFlags::ERROR | ResultFlags::NONEMPTY;
                continue;
            }
        };
        flags |= reconcile(source, collection, name, source_type, state, depth);
    }
    flags
}

/// Decides the fate of one collection entry given what the source holds under that name.
fn reconcile(
    source: BorrowedFd<'_>,
    collection: BorrowedFd<'_>,
    name: &CStr,
    source_type: Option<FileType>,
    state: &mut TraversalState<'_>,
    depth: Depth,
) -> ResultFlags {
    let entry = match classify(state, collection, name) {
        Ok(entry) => entry,
        Err(err) => {
            collection_failure(state, "access", Some(name), err);
            return ResultFlags::ERROR | ResultFlags::NONEMPTY;
        }
    };

    match (entry, source_type) {
        (Entry::Absent, _) => ResultFlags::empty(),

        (Entry::Directory, None) => remove_dir(collection, name, state),
        (Entry::Directory, Some(FileType::Directory)) => {
            enter(Operation::Refresh, source, collection, name, state, depth)
        }
        (Entry::Directory, Some(found)) => conflict(state, name, found, FileType::Directory),

        (Entry::Other(_), None) => skipped(state, name),
        (Entry::Other(found), Some(FileType::Directory)) => {
            conflict(state, name, FileType::Directory, found)
        }
        (Entry::Other(found), Some(_)) => occupied(state, name, found),

        (Entry::ManagedLink, None) => unlink(collection, name, state),
        (Entry::ManagedLink, Some(FileType::Directory)) => {
            conflict(state, name, FileType::Directory, FileType::Symlink)
        }
        (Entry::ManagedLink, Some(_)) => kept(state, name),

        (Entry::ForeignLink, None) => kept(state, name),
        (Entry::ForeignLink, Some(_)) => foreign_link(state, name),

        (Entry::InvalidLink, _) => invalid_link(state, name),
    }
}
