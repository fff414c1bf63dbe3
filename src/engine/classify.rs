//! Classification of directory entries shared by every operation.

use rustix::fs::{AtFlags, FileType, statat};
use rustix::io::Errno;
use std::ffi::CStr;
use std::os::fd::BorrowedFd;

use super::flags::ResultFlags;
use super::state::TraversalState;
use crate::utils::describe_errno;
use crate::utils::paths::is_normalized_path;

/// What a collection-side name turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Entry {
    /// Nothing by that name (possibly removed while we looked).
    Absent,
    /// A real directory.
    Directory,
    /// Some other non-symlink file; never touched.
    Other(FileType),
    /// A symlink pointing exactly at the matching source path.
    ManagedLink,
    /// A well-formed symlink pointing somewhere else.
    ForeignLink,
    /// A symlink whose target is not in normalized form.
    InvalidLink,
}

/// Classifies `name` inside the collection directory `dirfd`.
///
/// Symlink targets land in `state.link` for later messages.
pub(crate) fn classify(
    state: &mut TraversalState<'_>,
    dirfd: BorrowedFd<'_>,
    name: &CStr,
) -> Result<Entry, Errno> {
    match state.link.read_at(dirfd, name) {
        Ok(()) => {
            let target = state.link.target();
            if state.path.is_child_link(target, name.to_bytes()) {
                Ok(Entry::ManagedLink)
            } else if is_normalized_path(target) {
                Ok(Entry::ForeignLink)
            } else {
                Ok(Entry::InvalidLink)
            }
        }
        Err(Errno::INVAL) => match file_type_at(dirfd, name) {
            Ok(FileType::Directory) => Ok(Entry::Directory),
            Ok(other) => Ok(Entry::Other(other)),
            Err(Errno::NOENT) => Ok(Entry::Absent),
            Err(err) => Err(err),
        },
        Err(Errno::NOENT) => Ok(Entry::Absent),
        Err(err) => Err(err),
    }
}

/// `lstat`-style type lookup relative to `dirfd`.
pub(crate) fn file_type_at(dirfd: BorrowedFd<'_>, name: &CStr) -> Result<FileType, Errno> {
    let stat = statat(dirfd, name, AtFlags::SYMLINK_NOFOLLOW)?;
    Ok(FileType::from_raw_mode(stat.st_mode))
}

/// Human-readable name of a file type.
pub(crate) const fn describe(file_type: FileType) -> &'static str {
    match file_type {
        FileType::RegularFile => "file",
        FileType::Directory => "directory",
        FileType::Symlink => "symlink",
        FileType::Socket => "socket",
        FileType::Fifo => "named pipe",
        FileType::CharacterDevice => "character device",
        FileType::BlockDevice => "block device",
        _ => "unknown file",
    }
}

/// Reports a directory-versus-file clash between the two trees.
///
/// Neither side is touched; the name is reported with both types and, for a
/// collection-side symlink, its target.
pub(crate) fn conflict(
    state: &TraversalState<'_>,
    name: &CStr,
    source: FileType,
    collection: FileType,
) -> ResultFlags {
    let name = name.to_bytes();
    if collection == FileType::Symlink {
        state.logger.error(format_args!(
            "{} is a {} but {} is a {} to {}",
            state.source_path(Some(name)),
            describe(source),
            state.collection_path(Some(name)),
            describe(collection),
            state.link_target().display(),
        ));
    } else {
        state.logger.error(format_args!(
            "{} is a {} but {} is a {}",
            state.source_path(Some(name)),
            describe(source),
            state.collection_path(Some(name)),
            describe(collection),
        ));
    }
    ResultFlags::ERROR | ResultFlags::NONEMPTY
}

/// Reports a non-symlink collection entry standing where a link would go.
pub(crate) fn occupied(state: &TraversalState<'_>, name: &CStr, found: FileType) -> ResultFlags {
    state.logger.error(format_args!(
        "{} is a {}",
        state.collection_path(Some(name.to_bytes())),
        describe(found)
    ));
    ResultFlags::ERROR | ResultFlags::NONEMPTY
}

/// Reports a symlink whose target is not in normalized form.
pub(crate) fn invalid_link(state: &TraversalState<'_>, name: &CStr) -> ResultFlags {
    state.logger.warn(format_args!(
        "invalid symlink {}: {}",
        state.collection_path(Some(name.to_bytes())),
        state.link_target().display(),
    ));
    ResultFlags::WARN | ResultFlags::NONEMPTY
}

/// Reports a well-formed symlink that belongs to someone else.
pub(crate) fn foreign_link(state: &TraversalState<'_>, name: &CStr) -> ResultFlags {
    state.logger.warn(format_args!(
        "{} already links to {}",
        state.collection_path(Some(name.to_bytes())),
        state.link_target().display(),
    ));
    ResultFlags::WARN | ResultFlags::NONEMPTY
}

/// Notes a collection entry that is left alone without complaint.
pub(crate) fn kept(state: &TraversalState<'_>, name: &CStr) -> ResultFlags {
    state.logger.debug(format_args!(
        "kept    {}",
        state.collection_path(Some(name.to_bytes()))
    ));
    ResultFlags::NONEMPTY
}

/// Notes a non-symlink collection entry that is skipped.
pub(crate) fn skipped(state: &TraversalState<'_>, name: &CStr) -> ResultFlags {
    state.logger.debug(format_args!(
        "skipped {}",
        state.collection_path(Some(name.to_bytes()))
    ));
    ResultFlags::NONEMPTY
}

/// Reports a failed syscall on a collection entry.
pub(crate) fn collection_failure(
    state: &TraversalState<'_>,
    action: &str,
    name: Option<&CStr>,
    err: Errno,
) {
    state.logger.error(format_args!(
        "cannot {} {}: {}",
        action,
        state.collection_path(name.map(CStr::to_bytes)),
        describe_errno(err),
    ));
}

/// Reports a failed syscall on a source entry.
pub(crate) fn source_failure(
    state: &TraversalState<'_>,
    action: &str,
    name: Option<&CStr>,
    err: Errno,
) {
    state.logger.error(format_args!(
        "cannot {} {}: {}",
        action,
        state.source_path(name.map(CStr::to_bytes)),
        describe_errno(err),
    ));
}

/// Whether a directory entry is `.` or `..`.
pub(crate) fn is_dot_entry(name: &CStr) -> bool {
    matches!(name.to_bytes(), b"." | b"..")
}
