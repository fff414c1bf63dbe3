use rustix::fs::{AtFlags, unlinkat};
use rustix::io::Errno;
use std::ffi::CStr;
use std::os::fd::BorrowedFd;
use tracing::trace;

use super::Operation;
use super::classify::{
    Entry, classify, collection_failure, invalid_link, is_dot_entry, kept, skipped,
};
use super::flags::ResultFlags;
use super::state::{Depth, TraversalState};
use super::walker::{CollectionTarget, DirectoryPair, descend};

/// Deletes managed links, then every directory that ends up empty.
pub(crate) fn run(pair: &mut DirectoryPair, state: &mut TraversalState<'_>) -> ResultFlags {
    let (collection, Some(listing)) = pair.collection.split() else {
        trace!("remove called without a collection listing");
        return ResultFlags::ERROR | ResultFlags::NONEMPTY;
    };

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

        flags |= match classify(state, collection, name) {
            Err(err) => {
                collection_failure(state, "access", Some(name), err);
                ResultFlags::ERROR | ResultFlags::NONEMPTY
            }
            Ok(Entry::Absent) => ResultFlags::empty(),
            Ok(Entry::Directory) => remove_dir(collection, name, state),
            Ok(Entry::Other(_)) => skipped(state, name),
            Ok(Entry::ManagedLink) => unlink(collection, name, state),
            Ok(Entry::ForeignLink) => kept(state, name),
            Ok(Entry::InvalidLink) => invalid_link(state, name),
        };
    }
    flags
}

/// Empties a collection directory and deletes it if nothing is left behind.
pub(crate) fn remove_dir(
    collection: BorrowedFd<'_>,
    name: &CStr,
    state: &mut TraversalState<'_>,
) -> ResultFlags {
    let flags = descend(
        Operation::Remove,
        None,
        collection,
        name,
        state,
        Depth::Unlimited,
        CollectionTarget::SameName,
    );
    if flags.contains(ResultFlags::NONEMPTY) {
        return flags | kept(state, name);
    }

    match unlinkat(collection, name, AtFlags::REMOVEDIR) {
        Ok(()) => {
            state.logger.info(format_args!(
                "removed {}",
                state.collection_path(Some(name.to_bytes()))
            ));
            flags
        }
        Err(Errno::NOENT) => flags,
        Err(err) => {
            collection_failure(state, "unlink", Some(name), err);
            flags | ResultFlags::ERROR | ResultFlags::NONEMPTY
        }
    }
}

/// Deletes a managed link. A link that vanished meanwhile needs no deleting.
pub(crate) fn unlink(
    collection: BorrowedFd<'_>,
    name: &CStr,
    state: &mut TraversalState<'_>,
) -> ResultFlags {
    match unlinkat(collection, name, AtFlags::empty()) {
        Ok(()) => {
            state.logger.info(format_args!(
                "removed {}",
                state.collection_path(Some(name.to_bytes()))
            ));
            ResultFlags::empty()
        }
        Err(Errno::NOENT) => ResultFlags::empty(),
        Err(err) => {
            collection_failure(state, "unlink", Some(name), err);
            ResultFlags::ERROR | ResultFlags::NONEMPTY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Level, MemoryLogger};
    use crate::utils::buffers::PathBuffer;
    use std::ffi::CString;
    use std::fs;
    use std::os::fd::AsFd;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    #[test]
    fn test_remove_dir_keeps_foreign_content() {
        let temp_dir = TempDir::new().unwrap();
        let coll = temp_dir.path();
        fs::create_dir_all(coll.join("albums/empty")).unwrap();
        symlink("/src/albums/song", coll.join("albums/song")).unwrap();
        symlink("/elsewhere/other", coll.join("albums/other")).unwrap();

        let logger = MemoryLogger::new();
        let mut root = PathBuffer::new();
        root.set_root(b"/src").unwrap();
        let mut state = TraversalState::new(root, None, &logger);

        let dir = fs::File::open(coll).unwrap();
        let flags = remove_dir(dir.as_fd(), &CString::new("albums").unwrap(), &mut state);

        assert_eq!(flags, ResultFlags::NONEMPTY);
        assert!(fs::symlink_metadata(coll.join("albums/song")).is_err());
        assert!(!coll.join("albums/empty").exists());
        assert!(fs::symlink_metadata(coll.join("albums/other")).is_ok());
        assert!(logger.contains(Level::Debug, "kept    albums/other"));
        assert!(logger.contains(Level::Debug, "kept    albums"));
        assert!(logger.contains(Level::Info, "removed albums/empty"));
    }

    #[test]
    fn test_unlink_tolerates_vanished_link() {
        let temp_dir = TempDir::new().unwrap();
        let logger = MemoryLogger::new();
        let mut root = PathBuffer::new();
        root.set_root(b"/src").unwrap();
        let mut state = TraversalState::new(root, None, &logger);

        let dir = fs::File::open(temp_dir.path()).unwrap();
        let flags = unlink(dir.as_fd(), &CString::new("gone").unwrap(), &mut state);

        assert!(flags.is_empty());
        assert!(logger.lines().is_empty());
    }
}
