//! Growing byte buffers for the traversal.
//!
//! Both buffers grow in [`CHUNK_SIZE`] steps and never shrink during a run, so a
//! deep walk settles on a single allocation per buffer.

use rustix::io::Errno;
use std::collections::TryReserveError;
use std::ffi::CStr;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::path::Path;

use super::bytes_to_path;
use crate::CHUNK_SIZE;

/// Makes room for at least `total` bytes, rounding the capacity up to whole chunks.
fn grow_to(buf: &mut Vec<u8>, total: usize) -> Result<(), TryReserveError> {
    if total <= buf.capacity() {
        return Ok(());
    }
    let target = total.div_ceil(CHUNK_SIZE) * CHUNK_SIZE;
    buf.try_reserve_exact(target - buf.len())
}

fn last_errno() -> Errno {
    Errno::from_raw_os_error(io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO))
}

/// Absolute path of the entry being visited.
///
/// Used as a stack: [`push`](Self::push) returns the previous length and the
/// caller hands it back to [`truncate`](Self::truncate) once the child is done.
/// The bytes after [`offset`](Self::relative) are the part relative to the root
/// of the walk, which is what collection paths are rendered from.
#[derive(Debug, Clone, Default)]
pub struct PathBuffer {
    buf: Vec<u8>,
    offset: usize,
}

impl PathBuffer {
    /// Creates an empty buffer; nothing is allocated until first use.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            offset: 0,
        }
    }

    /// Replaces the contents with the current working directory.
    ///
    /// # Errors
    ///
    /// Returns the `getcwd` error (other than `ERANGE`, which triggers growth) or
    /// an out-of-memory error if the buffer cannot grow.
    pub fn load_cwd(&mut self) -> io::Result<()> {
        self.buf.clear();
        loop {
            let capacity = self.buf.capacity();
            if capacity > 0 {
                // SAFETY: the pointer is valid for `capacity` writable bytes and
                // getcwd writes at most that many, terminating NUL included.
                let cwd = unsafe { libc::getcwd(self.buf.as_mut_ptr().cast(), capacity) };
                if !cwd.is_null() {
                    // SAFETY: on success getcwd stored a NUL-terminated string at `cwd`.
                    let len = unsafe { CStr::from_ptr(cwd) }.to_bytes().len();
                    // SAFETY: the first `len` bytes were initialised by getcwd.
                    unsafe { self.buf.set_len(len) };
                    return Ok(());
                }
                let err = io::Error::last_os_error();
                if err.raw_os_error() != Some(libc::ERANGE) {
                    return Err(err);
                }
            }
            grow_to(&mut self.buf, capacity + CHUNK_SIZE)
                .map_err(|err| io::Error::new(io::ErrorKind::OutOfMemory, err))?;
        }
    }

    /// Sets the root of the walk. Everything appended afterwards counts as relative.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer cannot grow.
    pub fn set_root(&mut self, root: &[u8]) -> Result<(), TryReserveError> {
        self.buf.clear();
        grow_to(&mut self.buf, root.len() + 1)?;
        self.buf.extend_from_slice(root);
        self.offset = if self.needs_separator() {
            self.buf.len() + 1
        } else {
            self.buf.len()
        };
        Ok(())
    }

    /// Appends `/name` and returns the length to truncate back to.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer cannot grow; the contents are unchanged then.
    pub fn push(&mut self, name: &[u8]) -> Result<usize, TryReserveError> {
        let previous = self.buf.len();
        let separator = usize::from(self.needs_separator());
        grow_to(&mut self.buf, previous + separator + name.len())?;
        if separator == 1 {
            self.buf.push(b'/');
        }
        self.buf.extend_from_slice(name);
        Ok(previous)
    }

    /// Restores a length previously returned by [`push`](Self::push).
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    /// Current length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Allocated size in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// The full absolute path.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The part below the root of the walk; empty at the root itself.
    #[must_use]
    pub fn relative(&self) -> &[u8] {
        self.buf.get(self.offset..).unwrap_or_default()
    }

    /// Whether `target` is exactly `<this path>/<name>`.
    #[must_use]
    pub fn is_child_link(&self, target: &[u8], name: &[u8]) -> bool {
        let Some(rest) = target.strip_prefix(self.buf.as_slice()) else {
            return false;
        };
        let rest = if self.needs_separator() {
            match rest.strip_prefix(b"/") {
                Some(rest) => rest,
                None => return false,
            }
        } else {
            rest
        };
        rest == name
    }

    /// The path for display.
    #[must_use]
    pub fn display_path(&self) -> &Path {
        bytes_to_path(&self.buf)
    }

    fn needs_separator(&self) -> bool {
        self.buf.last() != Some(&b'/')
    }
}

/// Target of the most recently read symlink, reused across entries.
#[derive(Debug, Default)]
pub struct LinkBuffer {
    buf: Vec<u8>,
}

impl LinkBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Reads the target of `name` relative to `dirfd`.
    ///
    /// A result that fills the buffer completely may have been truncated, so the
    /// buffer grows by one chunk and the read is retried until it fits strictly.
    ///
    /// # Errors
    ///
    /// Returns the `readlinkat` error (`EINVAL` when `name` is not a symlink,
    /// `ENOENT` when it vanished) or `ENOMEM` if the buffer cannot grow.
    pub fn read_at(&mut self, dirfd: BorrowedFd<'_>, name: &CStr) -> Result<(), Errno> {
        self.buf.clear();
        loop {
            let capacity = self.buf.capacity();
            if capacity > 0 {
                // SAFETY: the pointer is valid for `capacity` writable bytes and
                // readlinkat writes at most that many.
                let read = unsafe {
                    libc::readlinkat(
                        dirfd.as_raw_fd(),
                        name.as_ptr(),
                        self.buf.as_mut_ptr().cast(),
                        capacity,
                    )
                };
                let Ok(read) = usize::try_from(read) else {
                    return Err(last_errno());
                };
                if read < capacity {
                    // SAFETY: readlinkat initialised the first `read` bytes.
                    unsafe { self.buf.set_len(read) };
                    return Ok(());
                }
            }
            grow_to(&mut self.buf, capacity + CHUNK_SIZE).map_err(|_| Errno::NOMEM)?;
        }
    }

    /// The last target read.
    #[must_use]
    pub fn target(&self) -> &[u8] {
        &self.buf
    }

    /// The last target for display.
    #[must_use]
    pub fn display_target(&self) -> &Path {
        bytes_to_path(&self.buf)
    }
}
