use rustix::fs::{FileType, Mode, mkdirat, symlinkat};
use rustix::io::Errno;
use std::ffi::CStr;
use std::os::fd::BorrowedFd;
use tracing::trace;

use super::Operation;
use super::classify::{
    Entry, classify, collection_failure, conflict, file_type_at, foreign_link, invalid_link,
    is_dot_entry, occupied, skipped, source_failure,
};
use super::flags::ResultFlags;
use super::state::{Depth, TraversalState};
use super::walker::{CollectionTarget, DirHandle, DirectoryPair, descend};

/// Creates whatever the collection directory lacks, driven by the source listing.
pub(crate) fn run(
    pair: &mut DirectoryPair,
    state: &mut TraversalState<'_>,
    depth: Depth,
) -> ResultFlags {
    let collection = pair.collection.fd();
    let Some((source, Some(listing))) = pair.source.as_mut().map(DirHandle::split) else {
        trace!("add called without a source listing");
        return ResultFlags::ERROR;
    };

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
        flags |= add_entry(source, collection, name, state, depth);
    }
    flags
}

fn add_entry(
    source: BorrowedFd<'_>,
    collection: BorrowedFd<'_>,
    name: &CStr,
    state: &mut TraversalState<'_>,
    depth: Depth,
) -> ResultFlags {
    let source_type = match file_type_at(source, name) {
        Ok(file_type) => file_type,
        Err(Errno::NOENT) => return ResultFlags::empty(),
        Err(err) => {
            source_failure(state, "access", Some(name), err);
            return ResultFlags::ERROR;
        }
    };
    let source_is_dir = source_type == FileType::Directory;

    match classify(state, collection, name) {
        Err(err) => {
            collection_failure(state, "access", Some(name), err);
            ResultFlags::ERROR | ResultFlags::NONEMPTY
        }
        Ok(Entry::Absent) => create_entry(source, collection, name, source_type, state, depth),
        Ok(Entry::ManagedLink) if source_is_dir => {
            conflict(state, name, source_type, FileType::Symlink)
        }
        Ok(Entry::ManagedLink) => {
            state.logger.debug(format_args!(
                "{} already exists",
                state.collection_path(Some(name.to_bytes()))
            ));
            ResultFlags::NONEMPTY
        }
        Ok(Entry::ForeignLink) => foreign_link(state, name),
        Ok(Entry::InvalidLink) => invalid_link(state, name),
        Ok(Entry::Directory) if source_is_dir => {
            enter(Operation::Add, source, collection, name, state, depth)
        }
        Ok(Entry::Directory) => conflict(state, name, source_type, FileType::Directory),
        Ok(Entry::Other(found)) if source_is_dir => conflict(state, name, source_type, found),
        Ok(Entry::Other(found)) => occupied(state, name, found),
    }
}

/// Descends into an existing directory pair unless the depth is used up.
pub(crate) fn enter(
    operation: Operation,
    source: BorrowedFd<'_>,
    collection: BorrowedFd<'_>,
    name: &CStr,
    state: &mut TraversalState<'_>,
    depth: Depth,
) -> ResultFlags {
    if depth.is_exhausted() {
        return skipped(state, name);
    }
    descend(
        operation,
        Some(source),
        collection,
        name,
        state,
        depth.deeper(),
        CollectionTarget::SameName,
    )
}

/// Mirrors a source entry that has no collection counterpart yet.
///
/// Directories are created and filled with `add`; anything else becomes a link.
pub(crate) fn create_entry(
    source: BorrowedFd<'_>,
    collection: BorrowedFd<'_>,
    name: &CStr,
    source_type: FileType,
    state: &mut TraversalState<'_>,
    depth: Depth,
) -> ResultFlags {
    if source_type != FileType::Directory {
        return create_symlink(collection, name, state);
    }
    if depth.is_exhausted() {
        trace!(name = ?name, "depth exhausted, not creating directory");
        return ResultFlags::empty();
    }

    if let Err(err) = mkdirat(collection, name, Mode::RWXU | Mode::RWXG | Mode::RWXO) {
        collection_failure(state, "create directory", Some(name), err);
        return ResultFlags::ERROR;
    }
    state.logger.info(format_args!(
        "created directory {}",
        state.collection_path(Some(name.to_bytes()))
    ));

    descend(
        Operation::Add,
        Some(source),
        collection,
        name,
        state,
        depth.deeper(),
        CollectionTarget::SameName,
    ) | ResultFlags::NONEMPTY
}

fn create_symlink(
    collection: BorrowedFd<'_>,
    name: &CStr,
    state: &mut TraversalState<'_>,
) -> ResultFlags {
    let created = match state.path.push(name.to_bytes()) {
        Ok(mark) => {
            let created = symlinkat(state.path.display_path(), collection, name);
            state.path.truncate(mark);
            created
        }
        Err(_) => Err(Errno::NOMEM),
    };

    match created {
        Ok(()) => {
            state.logger.info(format_args!(
                "created symlink {}",
                state.collection_path(Some(name.to_bytes()))
            ));
            ResultFlags::NONEMPTY
        }
        Err(err) => {
            collection_failure(state, "create symlink", Some(name), err);
            ResultFlags::ERROR
        }
    }
}
